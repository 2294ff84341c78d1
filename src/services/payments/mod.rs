pub mod router;
pub mod stripe;

use async_trait::async_trait;

/// Card-processor authorization request. The metadata fields carry enough of
/// the booking to reconcile a webhook even if the local join key is lost.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// Minor currency units (cents). Must be positive.
    pub amount: i64,
    pub currency: String,
    pub receipt_email: String,
    pub description: String,
    pub client_name: String,
    pub event_type: String,
    pub event_date: String,
    pub venue_name: String,
}

#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> anyhow::Result<CreatedIntent>;
}
