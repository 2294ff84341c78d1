//! Applies a payment-completed signal to a booking exactly once.
//!
//! Two entry points converge here: the card processor's webhook (carries a
//! provider intent id) and the client confirmation endpoint used for
//! peer-payment rails (carries a booking id and no proof of payment — that
//! trust gap is deliberate and audit-logged, not papered over). Whichever
//! signal observes a non-paid booking first wins; the loser sees `paid` and
//! no-ops. The race is settled by a single conditional UPDATE in the store,
//! never by a read-then-write here.

use chrono::NaiveDate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, IntentStatus, PaymentMethod};
use crate::services::notifications::{self, EmailOutcome};
use crate::state::AppState;

#[derive(Debug)]
pub struct ReconcileOutcome {
    pub booking: Booking,
    /// False when the booking was already paid (idempotent replay).
    pub newly_paid: bool,
    pub email: Option<EmailOutcome>,
}

/// Webhook path: `payment_intent.succeeded` for a provider intent id.
///
/// Missing mirror rows and unmatched bookings are logged and swallowed
/// (`Ok(None)`): the provider retries delivery on non-2xx, and repeating a
/// lookup that finds nothing is harmless.
pub async fn confirm_from_webhook(
    state: &AppState,
    intent_id: &str,
    amount: i64,
    receipt_email: Option<&str>,
) -> anyhow::Result<Option<ReconcileOutcome>> {
    let intent = {
        let db = state.db.lock().unwrap();
        queries::get_intent_by_id(&db, intent_id)?
    };

    let Some(intent) = intent else {
        tracing::warn!(intent_id, "no local record for payment intent, skipping");
        return Ok(None);
    };

    {
        let db = state.db.lock().unwrap();
        queries::set_intent_status(&db, intent_id, IntentStatus::Succeeded)?;
    }

    let booking = {
        let db = state.db.lock().unwrap();
        match &intent.booking_id {
            Some(id) => queries::get_booking_by_id(&db, id)?,
            None => None,
        }
    };

    // Fallback: reconcile by (email, event_date) from the intent metadata.
    let booking = match booking {
        Some(b) => Some(b),
        None => {
            let email = receipt_email.unwrap_or(&intent.email);
            match NaiveDate::parse_from_str(&intent.event_date, "%Y-%m-%d") {
                Ok(date) => {
                    let db = state.db.lock().unwrap();
                    queries::find_booking_by_email_and_date(&db, email, &date)?
                }
                Err(_) => None,
            }
        }
    };

    let Some(booking) = booking else {
        tracing::warn!(intent_id, "no booking matches payment intent, skipping");
        return Ok(None);
    };

    match apply_paid(state, booking, PaymentMethod::Card, amount, true).await {
        Ok(outcome) => Ok(Some(outcome)),
        Err(AppError::Conflict(reason)) => {
            tracing::warn!(intent_id, %reason, "webhook hit terminal booking, skipping");
            Ok(None)
        }
        Err(e) => Err(anyhow::anyhow!(e)),
    }
}

/// Marks an intent (and its booking, when in flight) failed.
pub async fn fail_from_webhook(state: &AppState, intent_id: &str) -> anyhow::Result<()> {
    let db = state.db.lock().unwrap();
    let Some(intent) = queries::get_intent_by_id(&db, intent_id)? else {
        tracing::warn!(intent_id, "no local record for failed intent, skipping");
        return Ok(());
    };

    queries::set_intent_status(&db, intent_id, IntentStatus::Failed)?;
    if let Some(booking_id) = &intent.booking_id {
        let changed = queries::update_booking_status(
            &db,
            booking_id,
            Some(BookingStatus::AwaitingPayment),
            BookingStatus::PaymentFailed,
        )?;
        if changed {
            tracing::info!(booking_id = %booking_id, intent_id, "booking marked payment_failed");
        }
    }
    Ok(())
}

/// Client-confirmation path for peer-payment rails and manual follow-up.
///
/// There is no server-side proof on these rails; the caller is trusted by
/// design and the confirmation is audit-logged. A booking that was never
/// routed through a payment flow (still `pending`) is rejected rather than
/// silently promoted.
pub async fn confirm_from_client(
    state: &AppState,
    booking_id: &str,
    method: PaymentMethod,
    amount: i64,
) -> Result<ReconcileOutcome, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?
    };

    if booking.status == BookingStatus::Pending {
        return Err(AppError::Conflict(format!(
            "booking {booking_id} has not been routed to a payment flow"
        )));
    }

    tracing::info!(
        booking_id,
        method = method.as_str(),
        amount,
        "client-reported payment confirmation (unverified rail)"
    );

    apply_paid(state, booking, method, amount, false).await
}

/// The convergence point. Idempotent: an already-paid booking returns its
/// stored state untouched, with no second email.
async fn apply_paid(
    state: &AppState,
    booking: Booking,
    method: PaymentMethod,
    amount: i64,
    promote_pending: bool,
) -> Result<ReconcileOutcome, AppError> {
    if booking.status == BookingStatus::Paid {
        return Ok(ReconcileOutcome {
            booking,
            newly_paid: false,
            email: None,
        });
    }
    if booking.status == BookingStatus::PaymentFailed {
        return Err(AppError::Conflict(format!(
            "booking {} already failed",
            booking.id
        )));
    }

    let won = {
        let db = state.db.lock().unwrap();

        // The webhook carries processor proof, so a booking the router never
        // touched (intent created directly) is first promoted into the
        // awaiting state; transitions never skip a step.
        if promote_pending && booking.status == BookingStatus::Pending {
            queries::update_booking_status(
                &db,
                &booking.id,
                Some(BookingStatus::Pending),
                BookingStatus::AwaitingPayment,
            )
            .map_err(|e| AppError::Storage(e.to_string()))?;
        }

        queries::mark_booking_paid(&db, &booking.id, method, amount)
            .map_err(|e| AppError::Storage(e.to_string()))?
    };

    let current = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &booking.id)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {}", booking.id)))?
    };

    if !won {
        // Lost the race or the precondition: paid now means someone else
        // completed the transition and this call is a replay.
        if current.status == BookingStatus::Paid {
            return Ok(ReconcileOutcome {
                booking: current,
                newly_paid: false,
                email: None,
            });
        }
        return Err(AppError::Conflict(format!(
            "booking {} is {} and cannot be confirmed",
            current.id,
            current.status.as_str()
        )));
    }

    tracing::info!(booking_id = %current.id, amount, method = method.as_str(), "booking paid");

    // Email outcome is reported, never propagated: payment success is
    // authoritative regardless of delivery.
    let email = notifications::send_confirmation(state, &current).await;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &current.id)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .unwrap_or(current)
    };

    Ok(ReconcileOutcome {
        booking,
        newly_paid: true,
        email: Some(email),
    })
}
