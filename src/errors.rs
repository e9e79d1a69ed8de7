use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::db::StoreError;
use crate::models::{DateError, RejectReason};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Rejected(#[from] RejectReason),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("too many bookings awaiting payment, try again shortly")]
    TooManyPending,
}

impl From<DateError> for AppError {
    fn from(err: DateError) -> Self {
        AppError::Rejected(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rejected(reason) => match reason {
                RejectReason::MissingFields
                | RejectReason::InvalidDateFormat(_)
                | RejectReason::InvalidDateRange(_) => StatusCode::BAD_REQUEST,
                RejectReason::RangeUnavailable | RejectReason::RangeNoLongerAvailable => {
                    StatusCode::CONFLICT
                }
                RejectReason::PaymentDeclined | RejectReason::PaymentProvider(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::TooManyPending => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
