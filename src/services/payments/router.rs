use chrono::Utc;
use serde::Serialize;

use super::IntentRequest;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, IntentStatus, PaymentIntentRecord, PaymentMethod};
use crate::state::AppState;

/// Next step the client should take after choosing a payment method.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PaymentStep {
    CardCheckout {
        #[serde(rename = "clientSecret")]
        client_secret: String,
    },
    ExternalLink {
        url: String,
        instructions: String,
    },
}

/// Routes a pending booking into the chosen payment flow.
///
/// Card: creates a processor intent, durably persists the local mirror before
/// the client secret is returned (a fast webhook must always find the mirror),
/// and moves the booking to `awaiting_payment`. Peer-payment: moves the
/// booking to `awaiting_external_confirmation` and hands back the merchant
/// link; the client self-reports completion afterwards.
pub async fn route_payment(
    state: &AppState,
    booking_id: &str,
    method: PaymentMethod,
) -> Result<PaymentStep, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?
    };

    if booking.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "booking {booking_id} is already {}",
            booking.status.as_str()
        )));
    }

    match method {
        PaymentMethod::Card => route_card(state, &booking).await,
        PaymentMethod::Venmo => route_external(state, &booking, method, &state.config.venmo_url),
        PaymentMethod::Cashapp => {
            route_external(state, &booking, method, &state.config.cashapp_url)
        }
    }
}

async fn route_card(state: &AppState, booking: &Booking) -> Result<PaymentStep, AppError> {
    let request = IntentRequest {
        amount: booking.total_amount,
        currency: "usd".to_string(),
        receipt_email: booking.email.clone(),
        description: format!(
            "DJ service for {} on {} at {}",
            booking.event_type, booking.event_date, booking.venue_name
        ),
        client_name: booking.client_name.clone(),
        event_type: booking.event_type.clone(),
        event_date: booking.event_date.to_string(),
        venue_name: booking.venue_name.clone(),
    };

    let created = state
        .gateway
        .create_intent(&request)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    // Mirror first, status second: the mirror row must exist before the
    // browser can complete the charge and trigger the webhook.
    {
        let db = state.db.lock().unwrap();
        let now = Utc::now().naive_utc();
        queries::create_intent(
            &db,
            &PaymentIntentRecord {
                id: created.id.clone(),
                booking_id: Some(booking.id.clone()),
                amount: request.amount,
                currency: request.currency.clone(),
                status: IntentStatus::RequiresConfirmation,
                client_name: request.client_name.clone(),
                email: request.receipt_email.clone(),
                event_type: request.event_type.clone(),
                event_date: request.event_date.clone(),
                venue_name: request.venue_name.clone(),
                created_at: now,
                updated_at: now,
            },
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;

        queries::update_booking_status(
            &db,
            &booking.id,
            Some(BookingStatus::Pending),
            BookingStatus::AwaitingPayment,
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;
    }

    tracing::info!(booking_id = %booking.id, intent_id = %created.id, "routed to card checkout");

    Ok(PaymentStep::CardCheckout {
        client_secret: created.client_secret,
    })
}

fn route_external(
    state: &AppState,
    booking: &Booking,
    method: PaymentMethod,
    url: &str,
) -> Result<PaymentStep, AppError> {
    {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(
            &db,
            &booking.id,
            Some(BookingStatus::Pending),
            BookingStatus::AwaitingExternalConfirmation,
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;
    }

    tracing::info!(booking_id = %booking.id, method = method.as_str(), "routed to external payment link");

    // If the client cannot open the link (popup blocked, no app installed)
    // the booking is still submitted; these instructions cover paying by hand.
    Ok(PaymentStep::ExternalLink {
        url: url.to_string(),
        instructions: format!(
            "Send ${} via {} at {url}, then confirm your payment on the booking page.",
            booking.total_amount / 100,
            method.as_str()
        ),
    })
}
