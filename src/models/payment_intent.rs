use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Local mirror of a processor-side payment intent. The booking back-reference
/// may be absent; the reconciler then falls back to an (email, event_date)
/// match against the metadata below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRecord {
    pub id: String,
    pub booking_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    pub client_name: String,
    pub email: String,
    pub event_type: String,
    pub event_date: String,
    pub venue_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresConfirmation,
    Succeeded,
    Failed,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "succeeded" => IntentStatus::Succeeded,
            "failed" => IntentStatus::Failed,
            _ => IntentStatus::RequiresConfirmation,
        }
    }
}
