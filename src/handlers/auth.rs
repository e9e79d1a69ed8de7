use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::JsonBody;
use crate::services::session::{self, SESSION_COOKIE};
use crate::state::AppState;

/// A valid session cookie, or the bearer token when one is configured.
pub fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let token = &state.config.admin_token;
    if !token.is_empty() {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if bearer == Some(token.as_str()) {
            return true;
        }
    }

    let now = Utc::now();
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|h| session::cookie_value(h, SESSION_COOKIE))
        .any(|v| session::verify(&state.config.session_secret, v, now))
}

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if is_admin(state, headers) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// POST /api/login
pub async fn login(State(state): State<Arc<AppState>>, JsonBody(req): JsonBody<LoginRequest>) -> Response {
    let config = &state.config;
    let valid = req.username == config.admin_user && req.password == config.admin_pass;

    let cookie = valid
        .then(|| session::issue(&config.session_secret, Utc::now()))
        .flatten();
    let Some(cookie) = cookie else {
        tracing::warn!(username = %req.username, "failed admin login");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"success": false})),
        )
            .into_response();
    };

    tracing::info!("admin logged in");
    (
        [(header::SET_COOKIE, session::set_cookie_header(&cookie, config.production))],
        Json(serde_json::json!({"success": true})),
    )
        .into_response()
}

// POST /api/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::SET_COOKIE, session::clear_cookie_header(state.config.production))],
        Json(serde_json::json!({"success": true})),
    )
        .into_response()
}
