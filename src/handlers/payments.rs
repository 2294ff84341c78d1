use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{IntentStatus, PaymentIntentRecord, PaymentMethod};
use crate::services::payments::IntentRequest;
use crate::services::reconciler;
use crate::state::AppState;

use super::bookings::BookingSummary;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub amount: Option<i64>,
    pub email: Option<String>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub venue_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

// POST /api/create-payment-intent
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let amount = request
        .amount
        .ok_or_else(|| AppError::Validation("missing required field: amount".to_string()))?;
    let email = request
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("missing required field: email".to_string()))?;
    if amount <= 0 {
        return Err(AppError::Validation(
            "amount must be a positive integer in cents".to_string(),
        ));
    }

    let intent_request = IntentRequest {
        amount,
        currency: "usd".to_string(),
        receipt_email: email.clone(),
        description: format!(
            "DJ service for {} on {} at {}",
            non_empty(&request.event_type, "Event"),
            non_empty(&request.event_date, "TBD"),
            non_empty(&request.venue_name, "Venue"),
        ),
        client_name: request.client_name.clone(),
        event_type: request.event_type.clone(),
        event_date: request.event_date.clone(),
        venue_name: request.venue_name.clone(),
    };

    let created = state
        .gateway
        .create_intent(&intent_request)
        .await
        .map_err(|e| AppError::Gateway(e.to_string()))?;

    // Resolve the booking back-reference up front when one exists, so the
    // webhook does not have to rely on the metadata fallback. The mirror is
    // persisted before the client secret leaves this handler.
    {
        let db = state.db.lock().unwrap();
        let booking_id = NaiveDate::parse_from_str(&request.event_date, "%Y-%m-%d")
            .ok()
            .and_then(|date| {
                queries::find_booking_by_email_and_date(&db, &email, &date)
                    .ok()
                    .flatten()
            })
            .map(|b| b.id);

        let now = Utc::now().naive_utc();
        queries::create_intent(
            &db,
            &PaymentIntentRecord {
                id: created.id.clone(),
                booking_id,
                amount,
                currency: "usd".to_string(),
                status: IntentStatus::RequiresConfirmation,
                client_name: request.client_name,
                email,
                event_type: request.event_type,
                event_date: request.event_date,
                venue_name: request.venue_name,
                created_at: now,
                updated_at: now,
            },
        )
        .map_err(|e| AppError::Storage(e.to_string()))?;
    }

    tracing::info!(intent_id = %created.id, amount, "payment intent created");

    Ok(Json(CreateIntentResponse {
        client_secret: created.client_secret,
    }))
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub booking_id: String,
    pub payment_method: String,
    pub amount: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub newly_paid: bool,
    pub booking: BookingSummary,
    pub email_sent: bool,
    pub email_warning: Option<String>,
}

// POST /api/payment-confirmation
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, AppError> {
    let method = PaymentMethod::parse(&request.payment_method).ok_or_else(|| {
        AppError::Validation(format!("unknown payment method: {}", request.payment_method))
    })?;

    let outcome = {
        let declared = request.amount;
        let booking_id = request.booking_id.clone();
        let amount = match declared {
            Some(amount) if amount > 0 => amount,
            Some(_) => {
                return Err(AppError::Validation(
                    "amount must be a positive integer in cents".to_string(),
                ))
            }
            // Undeclared amount falls back to the quoted total.
            None => {
                let db = state.db.lock().unwrap();
                queries::get_booking_by_id(&db, &booking_id)
                    .map_err(|e| AppError::Storage(e.to_string()))?
                    .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?
                    .total_amount
            }
        };
        reconciler::confirm_from_client(&state, &booking_id, method, amount).await?
    };

    let (email_sent, email_warning) = match &outcome.email {
        Some(outcome) => (outcome.sent, outcome.warning.clone()),
        None => (outcome.booking.confirmation_email_sent, None),
    };

    Ok(Json(ConfirmPaymentResponse {
        success: true,
        newly_paid: outcome.newly_paid,
        booking: BookingSummary::from_booking(&outcome.booking),
        email_sent,
        email_warning,
    }))
}
