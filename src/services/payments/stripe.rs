use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{CreatedIntent, IntentRequest, PaymentGateway};

pub struct StripeGateway {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct StripeIntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &IntentRequest) -> anyhow::Result<CreatedIntent> {
        anyhow::ensure!(
            request.amount > 0,
            "intent amount must be positive, got {}",
            request.amount
        );

        let amount = request.amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("receipt_email", request.receipt_email.as_str()),
            ("description", request.description.as_str()),
            ("metadata[clientName]", request.client_name.as_str()),
            ("metadata[eventType]", request.event_type.as_str()),
            ("metadata[eventDate]", request.event_date.as_str()),
            ("metadata[venueName]", request.venue_name.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .client
            .post("https://api.stripe.com/v1/payment_intents")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .context("failed to reach card processor")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<StripeErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| "unknown processor error".to_string());
            anyhow::bail!("card processor rejected intent ({status}): {message}");
        }

        let intent: StripeIntentResponse = response
            .json()
            .await
            .context("failed to parse processor response")?;

        Ok(CreatedIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
