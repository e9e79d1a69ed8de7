use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::handlers::auth::is_admin;
use crate::handlers::JsonBody;
use crate::services::reservation::{BookingOutcome, BookingRequest};
use crate::state::AppState;

pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true}))
}

/// Occupied range as shown to the public calendar, without guest details.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedRange {
    id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    bookings: Vec<OccupiedRange>,
    blocks: Vec<OccupiedRange>,
}

// GET /api/availability
pub async fn availability(State(state): State<Arc<AppState>>) -> Json<AvailabilityResponse> {
    let snapshot = state.store.load().await;
    Json(AvailabilityResponse {
        bookings: snapshot
            .bookings
            .into_iter()
            .map(|b| OccupiedRange {
                id: b.id,
                start_date: b.start_date,
                end_date: b.end_date,
            })
            .collect(),
        blocks: snapshot
            .blocks
            .into_iter()
            .map(|b| OccupiedRange {
                id: b.id,
                start_date: b.start_date,
                end_date: b.end_date,
            })
            .collect(),
    })
}

// POST /api/book
pub async fn book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<BookingRequest>,
) -> Result<Response, AppError> {
    let admin = is_admin(&state, &headers);

    let response = match state.reservations.request_booking(req, admin).await? {
        BookingOutcome::Manual(booking) => Json(serde_json::json!({
            "success": true,
            "booking": booking,
        }))
        .into_response(),
        BookingOutcome::PaymentPending(started) => Json(started).into_response(),
    };
    Ok(response)
}
