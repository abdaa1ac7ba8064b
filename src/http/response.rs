//! Error responses.
//!
//! Exchange errors map onto HTTP status codes; the body carries the
//! human-readable message and the stable error code:
//!
//! ```text
//! {"error": "topic pattern cannot contain consecutive stars", "code": "consecutive_stars"}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ExchangeError, StoreError};

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub ExchangeError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ExchangeError::Validation(_)
            | ExchangeError::QueueNameRequired
            | ExchangeError::PayloadRequired
            | ExchangeError::NegativeDelay(_) => StatusCode::BAD_REQUEST,
            ExchangeError::Store(StoreError::QueueNotFound(_)) => StatusCode::NOT_FOUND,
            ExchangeError::Store(StoreError::QueueUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ExchangeError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExchangeError> for ApiError {
    fn from(e: ExchangeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "Request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}
