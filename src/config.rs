use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub email_api_url: String,
    pub email_service_id: String,
    pub email_template_id: String,
    pub email_user_id: String,
    pub admin_email: String,
    pub venmo_url: String,
    pub cashapp_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "gigbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.emailjs.com/api/v1.0/email/send".to_string()),
            email_service_id: env::var("EMAIL_SERVICE_ID").unwrap_or_default(),
            email_template_id: env::var("EMAIL_TEMPLATE_ID").unwrap_or_default(),
            email_user_id: env::var("EMAIL_USER_ID").unwrap_or_default(),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            venmo_url: env::var("VENMO_URL")
                .unwrap_or_else(|_| "https://venmo.com/u/Bobby-Martin-64".to_string()),
            cashapp_url: env::var("CASHAPP_URL")
                .unwrap_or_else(|_| "https://cash.app/$LiveCity".to_string()),
        }
    }
}
