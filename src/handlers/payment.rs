use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::services::payment::PaymentStatus;
use crate::services::reservation::PaymentProgress;
use crate::state::AppState;

// GET /api/payment-status/:id
pub async fn payment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let status: PaymentProgress = state.reservations.payment_status(&id).await;
    Json(serde_json::json!({ "status": status }))
}

// POST /api/payment-cancel/:id
pub async fn payment_cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let success = state.reservations.cancel(&id);
    Json(serde_json::json!({ "success": success }))
}

#[derive(Deserialize)]
struct SwishCallback {
    id: String,
    status: String,
}

/// POST /api/swish-callback
///
/// The provider only needs to know the callback arrived, so every outcome,
/// including bodies we cannot read and reservations we reject, is `200`.
pub async fn swish_callback(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let callback: SwishCallback = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable payment callback");
            return StatusCode::OK;
        }
    };

    let status = PaymentStatus::parse(&callback.status);
    tracing::info!(payment_id = %callback.id, ?status, "payment callback received");

    if let Err(e) = state.reservations.settle_payment(&callback.id, status).await {
        tracing::error!(payment_id = %callback.id, error = %e, "failed to settle payment");
    }

    StatusCode::OK
}
