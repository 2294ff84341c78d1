use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::services::reconciler;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Deserialize)]
pub struct StripeEventData {
    pub object: StripeIntentObject,
}

#[derive(Deserialize)]
pub struct StripeIntentObject {
    pub id: String,
    pub amount: i64,
    pub receipt_email: Option<String>,
}

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`): the
/// signed payload is `{t}.{body}` under HMAC-SHA256 of the endpoint secret.
fn validate_stripe_signature(secret: &str, signature: &str, payload: &str) -> bool {
    let mut timestamp = None;
    let mut candidates = vec![];
    for part in signature.split(',') {
        match part.trim().split_once('=') {
            Some(("t", t)) => timestamp = Some(t),
            Some(("v1", sig)) => candidates.push(sig),
            _ => {}
        }
    }
    let (Some(timestamp), false) = (timestamp, candidates.is_empty()) else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    candidates.iter().any(|sig| *sig == expected)
}

pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // Signature check is skipped if the endpoint secret is empty — dev mode.
    if !state.config.stripe_webhook_secret.is_empty() {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty()
            || !validate_stripe_signature(&state.config.stripe_webhook_secret, signature, &body)
        {
            tracing::warn!("webhook signature verification failed");
            return (StatusCode::BAD_REQUEST, "invalid signature").into_response();
        }
    }

    let event: StripeEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable webhook payload");
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    // From here on the response is always 200: the provider retries non-2xx
    // deliveries, and application-level no-ops must not trigger retry storms.
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            let object = event.data.object;
            tracing::info!(intent_id = %object.id, amount = object.amount, "payment succeeded webhook");
            let result = reconciler::confirm_from_webhook(
                &state,
                &object.id,
                object.amount,
                object.receipt_email.as_deref(),
            )
            .await;
            match result {
                Ok(Some(outcome)) => {
                    tracing::info!(
                        booking_id = %outcome.booking.id,
                        newly_paid = outcome.newly_paid,
                        "webhook reconciled"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(intent_id = %object.id, error = %e, "webhook reconciliation failed");
                }
            }
        }
        "payment_intent.payment_failed" => {
            let object = event.data.object;
            tracing::info!(intent_id = %object.id, "payment failed webhook");
            if let Err(e) = reconciler::fail_from_webhook(&state, &object.id).await {
                tracing::error!(intent_id = %object.id, error = %e, "failed-intent handling error");
            }
        }
        other => {
            tracing::debug!(event_type = other, "ignoring webhook event");
        }
    }

    (StatusCode::OK, Json(serde_json::json!({ "received": true }))).into_response()
}
