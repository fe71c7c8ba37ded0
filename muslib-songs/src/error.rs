//! Error types for muslib-songs
//!
//! Every failure leaves the service as `{"msg": "..."}` with one of four
//! statuses. Storage and upstream details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Generic message for failures whose detail stays in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed id, malformed body or failed validation (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Song or verse index absent (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Duplicate song (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure, upstream failure, decode failure (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal() -> Self {
        ApiError::Internal(INTERNAL_ERROR_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl From<muslib_common::Error> for ApiError {
    fn from(err: muslib_common::Error) -> Self {
        match err {
            muslib_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            muslib_common::Error::Conflict(msg) => ApiError::Conflict(msg),
            muslib_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                error!("Store failure: {}", other);
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "msg": self.message(),
        }));

        (self.status(), body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
