//! Error types for lms-web
//!
//! Every error renders as a flat `{"error": "..."}` body, matching the
//! shape the payment gateway and the front end both expect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lms_common::api::ErrorBody;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Paid course accessed through a free path (402)
    #[error("{0}")]
    PaymentRequired(String),

    /// Caller lacks access to the resource (403)
    #[error("{0}")]
    Forbidden(String),

    /// Conflict (409) - e.g., already enrolled
    #[error("{0}")]
    Conflict(String),

    /// Storage did not answer within the configured bound (503)
    #[error("Storage timeout: {0}")]
    Timeout(String),

    /// Database failure (500); details are logged, not returned
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<lms_common::Error> for ApiError {
    fn from(err: lms_common::Error) -> Self {
        match err {
            lms_common::Error::Database(e) => ApiError::Database(e),
            lms_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            lms_common::Error::InvalidAmount(msg) => ApiError::BadRequest(msg),
            lms_common::Error::Timeout(msg) => ApiError::Timeout(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Timeout(op) => {
                error!(operation = %op, "Storage operation timed out");
                (StatusCode::SERVICE_UNAVAILABLE, "Storage timeout".to_string())
            }
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let cases = [
            (lms_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (lms_common::Error::InvalidAmount("x".into()), StatusCode::BAD_REQUEST),
            (lms_common::Error::Timeout("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (lms_common::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let response = ApiError::Internal("secret path /etc/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
