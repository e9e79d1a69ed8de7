pub mod admin;
pub mod auth;
pub mod booking;
pub mod payment;

use std::sync::Arc;

use axum::extract::FromRequest;
use axum::routing::{get, post};
use axum::Router;

use crate::errors::AppError;
use crate::state::AppState;

/// `axum::Json` whose rejections (bad JSON, wrong field types, missing
/// content type) are answered as `400 {"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// JSON API routes. Static assets and HTTP layers are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ping", get(booking::ping))
        .route("/api/availability", get(booking::availability))
        .route("/api/book", post(booking::book))
        .route("/api/payment-status/:id", get(payment::payment_status))
        .route("/api/payment-cancel/:id", post(payment::payment_cancel))
        .route("/api/swish-callback", post(payment::swish_callback))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/calendar", get(admin::calendar))
        .route("/api/remove", post(admin::remove))
        .route("/api/block", post(admin::block))
        .route("/api/statistics", get(admin::statistics))
        .with_state(state)
}
