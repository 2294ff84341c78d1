pub mod emailjs;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

use crate::db::queries;
use crate::models::Booking;
use crate::services::receipt::{self, ReceiptData};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}

/// Outcome of a delivery attempt. Never an error: email failure must not
/// disturb the booking's payment state, so callers get a structured result
/// with a user-facing fallback message instead.
#[derive(Debug, Clone, Serialize)]
pub struct EmailOutcome {
    pub sent: bool,
    pub warning: Option<String>,
}

impl EmailOutcome {
    fn ok() -> Self {
        Self {
            sent: true,
            warning: None,
        }
    }

    fn failed(warning: impl Into<String>) -> Self {
        Self {
            sent: false,
            warning: Some(warning.into()),
        }
    }
}

const FALLBACK_MESSAGE: &str =
    "We've saved your booking but couldn't send the confirmation email right now. \
     We'll contact you shortly.";

/// Sends the confirmation email with the PDF receipt attached, then a short
/// payment alert to the operator. Safe to call repeatedly: once the
/// confirmation flag is set on the booking it becomes a no-op.
pub async fn send_confirmation(state: &AppState, booking: &Booking) -> EmailOutcome {
    if booking.confirmation_email_sent {
        return EmailOutcome::ok();
    }

    let pdf = receipt::render_pdf(&ReceiptData::from_booking(booking));
    let amount = receipt::format_usd(booking.paid_amount.unwrap_or(booking.total_amount));

    let email = OutgoingEmail {
        to: booking.email.clone(),
        to_name: booking.client_name.clone(),
        subject: "Your Booking Confirmation & Receipt".to_string(),
        body: format!(
            "Thank you for your booking, {}!\n\n\
             Event: {} on {}\n\
             Venue: {}\n\
             Time: {} - {}\n\
             Amount paid: {}\n\n\
             Your receipt is attached. We'll reach out about two weeks before \
             your event to go over the details.",
            booking.client_name,
            booking.event_type,
            booking.event_date,
            booking.venue_name,
            booking.start_time,
            booking.end_time,
            amount,
        ),
        attachment: Some(EmailAttachment {
            filename: "receipt.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: pdf,
        }),
    };

    if let Err(e) = state.mailer.send(&email).await {
        tracing::warn!(booking_id = %booking.id, error = %e, "confirmation email failed");
        return EmailOutcome::failed(FALLBACK_MESSAGE);
    }

    {
        let db = state.db.lock().unwrap();
        if let Err(e) = queries::set_email_flags(&db, &booking.id, true, true) {
            tracing::error!(booking_id = %booking.id, error = %e, "failed to record email flags");
        }
    }

    notify_operator(state, booking, &amount).await;

    EmailOutcome::ok()
}

/// Reminder two weeks ahead of the event. The caller owns the reminder flag.
pub async fn send_reminder(state: &AppState, booking: &Booking) -> anyhow::Result<()> {
    let email = OutgoingEmail {
        to: booking.email.clone(),
        to_name: booking.client_name.clone(),
        subject: "Your Event Is Two Weeks Away".to_string(),
        body: format!(
            "Hi {}, this is a reminder that your {} is coming up on {} at {}. \
             Please confirm your details or final payment.",
            booking.client_name, booking.event_type, booking.event_date, booking.venue_name,
        ),
        attachment: None,
    };
    state.mailer.send(&email).await
}

async fn notify_operator(state: &AppState, booking: &Booking, amount: &str) {
    if state.config.admin_email.is_empty() {
        return;
    }

    let alert = OutgoingEmail {
        to: state.config.admin_email.clone(),
        to_name: "Operator".to_string(),
        subject: "Payment Received".to_string(),
        body: format!(
            "New payment from {} for {} on {}. Amount: {}.",
            booking.client_name, booking.event_type, booking.event_date, amount,
        ),
        attachment: None,
    };

    if let Err(e) = state.mailer.send(&alert).await {
        tracing::warn!(booking_id = %booking.id, error = %e, "operator alert failed");
    }
}

/// Encodes an attachment the way browser-side mailers embed files: a data URI
/// the email template can link or attach.
pub fn attachment_data_uri(attachment: &EmailAttachment) -> String {
    format!(
        "data:{};base64,{}",
        attachment.content_type,
        base64::engine::general_purpose::STANDARD.encode(&attachment.data)
    )
}
