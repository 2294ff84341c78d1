use anyhow::Context;
use async_trait::async_trait;

use super::{attachment_data_uri, EmailProvider, OutgoingEmail};

/// Transactional-email provider speaking the EmailJS REST API: one JSON POST
/// per message, template parameters carry the content, attachments travel as
/// base64 data URIs.
pub struct EmailJsProvider {
    api_url: String,
    service_id: String,
    template_id: String,
    user_id: String,
    client: reqwest::Client,
}

impl EmailJsProvider {
    pub fn new(api_url: String, service_id: String, template_id: String, user_id: String) -> Self {
        Self {
            api_url,
            service_id,
            template_id,
            user_id,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for EmailJsProvider {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.service_id.is_empty() && !self.template_id.is_empty() && !self.user_id.is_empty(),
            "email service configuration missing"
        );

        let mut template_params = serde_json::json!({
            "to_email": email.to,
            "to_name": email.to_name,
            "subject": email.subject,
            "message": email.body,
        });
        if let Some(attachment) = &email.attachment {
            template_params["attachment_name"] =
                serde_json::Value::String(attachment.filename.clone());
            template_params["attachment_data"] =
                serde_json::Value::String(attachment_data_uri(attachment));
        }

        let payload = serde_json::json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.user_id,
            "template_params": template_params,
        });

        self.client
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .context("failed to reach email provider")?
            .error_for_status()
            .context("email provider returned error")?;

        Ok(())
    }
}
