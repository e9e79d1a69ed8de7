use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::auth::require_admin;
use crate::handlers::JsonBody;
use crate::models::{AvailabilitySnapshot, YearStats};
use crate::services::statistics::compute_year_stats;
use crate::state::AppState;

// GET /api/calendar
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AvailabilitySnapshot>, AppError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.load().await))
}

// POST /api/remove
#[derive(Deserialize)]
pub struct RemoveRequest {
    pub id: Option<String>,
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<RemoveRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    let Some(id) = req.id.filter(|id| !id.trim().is_empty()) else {
        return Err(AppError::InvalidInput("id is required".to_string()));
    };

    let removed = state.store.remove(&id).await?;
    tracing::info!(id = %id, bookings = removed.bookings, blocks = removed.blocks, "entries removed");

    Ok(Json(serde_json::json!({
        "success": true,
        "removed": removed,
    })))
}

// POST /api/block
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn block(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<BlockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;

    let block = state
        .reservations
        .place_block(req.start_date, req.end_date)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "id": block.id,
    })))
}

// GET /api/statistics
#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub year: Option<i32>,
}

pub async fn statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<YearStats>, AppError> {
    require_admin(&state, &headers)?;

    let year = query.year.unwrap_or_else(|| state.clock.today().year());
    let snapshot = state.store.load().await;

    Ok(Json(compute_year_stats(
        &snapshot.bookings,
        year,
        state.config.daily_rate,
    )))
}
