use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub event_type: String,
    pub guest_count: i32,
    pub venue_name: String,
    pub venue_address: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub lighting: bool,
    pub photography: bool,
    pub video: bool,
    pub additional_hours: i32,
    /// Quoted total in cents.
    pub total_amount: i64,
    pub payment_method: Option<PaymentMethod>,
    pub status: BookingStatus,
    pub paid_amount: Option<i64>,
    pub paid_at: Option<NaiveDateTime>,
    pub confirmation_email_sent: bool,
    pub receipt_sent: bool,
    pub reminder_sent: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    AwaitingPayment,
    AwaitingExternalConfirmation,
    Paid,
    PaymentFailed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::AwaitingPayment => "awaiting_payment",
            BookingStatus::AwaitingExternalConfirmation => "awaiting_external_confirmation",
            BookingStatus::Paid => "paid",
            BookingStatus::PaymentFailed => "payment_failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "awaiting_payment" => BookingStatus::AwaitingPayment,
            "awaiting_external_confirmation" => BookingStatus::AwaitingExternalConfirmation,
            "paid" => BookingStatus::Paid,
            "payment_failed" => BookingStatus::PaymentFailed,
            _ => BookingStatus::Pending,
        }
    }

    /// Terminal statuses accept no further automated transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::PaymentFailed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Venmo,
    Cashapp,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Venmo => "venmo",
            PaymentMethod::Cashapp => "cashapp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "card" | "stripe" => Some(PaymentMethod::Card),
            "venmo" => Some(PaymentMethod::Venmo),
            "cashapp" => Some(PaymentMethod::Cashapp),
            _ => None,
        }
    }
}
