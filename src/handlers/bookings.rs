use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentMethod};
use crate::services::payments::router::{self, PaymentStep};
use crate::services::pricing::{self, PackageOptions};
use crate::services::receipt;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub event_type: String,
    #[serde(default)]
    pub guest_count: i32,
    pub venue_name: String,
    pub venue_address: String,
    pub event_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub lighting: bool,
    #[serde(default)]
    pub photography: bool,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub agree_to_terms: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub id: String,
    pub status: String,
    pub additional_hours: i32,
    /// Cents.
    pub total_amount: i64,
}

fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

fn validate_phone(phone: &str) -> bool {
    phone.chars().filter(|c| c.is_ascii_digit()).count() == 10
}

fn validate_address(address: &str) -> bool {
    address.len() >= 5
        && address.chars().any(|c| c.is_ascii_alphabetic())
        && address.chars().any(|c| c.is_ascii_digit())
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    if !validate_email(&request.email) {
        return Err(AppError::Validation("enter a valid email".to_string()));
    }
    if !validate_phone(&request.phone) {
        return Err(AppError::Validation(
            "enter a valid 10-digit phone number".to_string(),
        ));
    }
    if !validate_address(&request.venue_address) {
        return Err(AppError::Validation(
            "enter a valid venue address".to_string(),
        ));
    }
    if !request.agree_to_terms {
        return Err(AppError::Validation(
            "please agree to the terms".to_string(),
        ));
    }

    // Hours and total are always derived server-side from the submitted
    // times and options; the client never supplies either.
    let additional_hours = pricing::additional_hours(&request.start_time, &request.end_time);
    let options = PackageOptions {
        lighting: request.lighting,
        photography: request.photography,
        video: request.video,
        additional_hours,
    };
    let total_amount = pricing::total_cents(&options);

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        client_name: request.client_name,
        email: request.email,
        phone: request.phone,
        event_type: request.event_type,
        guest_count: request.guest_count,
        venue_name: request.venue_name,
        venue_address: request.venue_address,
        event_date: request.event_date,
        start_time: request.start_time,
        end_time: request.end_time,
        lighting: request.lighting,
        photography: request.photography,
        video: request.video,
        additional_hours,
        total_amount,
        payment_method: None,
        status: BookingStatus::Pending,
        paid_amount: None,
        paid_at: None,
        confirmation_email_sent: false,
        receipt_sent: false,
        reminder_sent: false,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking).map_err(|e| AppError::Storage(e.to_string()))?;
    }

    tracing::info!(booking_id = %booking.id, total_amount, "booking created");

    Ok(Json(CreateBookingResponse {
        id: booking.id,
        status: booking.status.as_str().to_string(),
        additional_hours,
        total_amount,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: String,
    pub client_name: String,
    pub email: String,
    pub event_type: String,
    pub event_date: String,
    pub venue_name: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub total_amount: i64,
    pub total_display: String,
    pub paid_amount: Option<i64>,
    pub confirmation_email_sent: bool,
    pub receipt_sent: bool,
}

impl BookingSummary {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id.clone(),
            client_name: booking.client_name.clone(),
            email: booking.email.clone(),
            event_type: booking.event_type.clone(),
            event_date: booking.event_date.to_string(),
            venue_name: booking.venue_name.clone(),
            start_time: booking.start_time.clone(),
            end_time: booking.end_time.clone(),
            status: booking.status.as_str().to_string(),
            payment_method: booking.payment_method.map(|m| m.as_str().to_string()),
            total_amount: booking.total_amount,
            total_display: receipt::format_usd(booking.total_amount),
            paid_amount: booking.paid_amount,
            confirmation_email_sent: booking.confirmation_email_sent,
            receipt_sent: booking.receipt_sent,
        }
    }
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingSummary>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)
            .map_err(|e| AppError::Storage(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };

    Ok(Json(BookingSummary::from_booking(&booking)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_method: String,
}

// POST /api/bookings/:id/pay
pub async fn pay_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<PayRequest>,
) -> Result<Json<PaymentStep>, AppError> {
    let method = PaymentMethod::parse(&request.payment_method).ok_or_else(|| {
        AppError::Validation(format!("unknown payment method: {}", request.payment_method))
    })?;

    let step = router::route_payment(&state, &id, method).await?;
    Ok(Json(step))
}
