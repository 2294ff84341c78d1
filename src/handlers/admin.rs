use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::state::AppState;

use super::bookings::BookingSummary;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingSummary>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, status_filter, limit).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        })?
    };

    let response = bookings.iter().map(BookingSummary::from_booking).collect();
    Ok(Json(response))
}
