//! Payment gateway webhook
//!
//! `POST /payment/webhook` receives asynchronous payment status
//! notifications. Checks run in a fixed order and each rejection returns
//! before anything is written:
//!
//! 1. method is POST
//! 2. gateway secret is configured
//! 3. `X-Kaspi-Signature` matches the HMAC-SHA256 of the raw body
//! 4. body names a known invoice
//! 5. amount is well formed and not below the recorded amount
//! 6. status transition is allowed
//!
//! Accepted notifications are acknowledged with `{"status": "ok"}`, so the
//! gateway can safely retry.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lms_common::api::{verify_signature, ErrorBody, StatusBody, SIGNATURE_HEADER};
use tracing::{error, warn};

use crate::db::bounded;
use crate::services::payments::{reconcile, Notification, ReconcileError};
use crate::AppState;

/// Every way the webhook can refuse a notification
#[derive(Debug)]
pub enum WebhookRejection {
    InvalidMethod,
    SecretNotSet,
    InvalidSignature,
    NotFound,
    InvalidAmountFormat,
    InvalidAmount,
    InvalidTransition,
    StorageTimeout,
    Storage(lms_common::Error),
}

impl From<ReconcileError> for WebhookRejection {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::NotFound => WebhookRejection::NotFound,
            ReconcileError::InvalidAmountFormat => WebhookRejection::InvalidAmountFormat,
            ReconcileError::Underpaid { .. } => WebhookRejection::InvalidAmount,
            ReconcileError::InvalidTransition { .. } => WebhookRejection::InvalidTransition,
            ReconcileError::Storage(e) if e.is_timeout() => WebhookRejection::StorageTimeout,
            ReconcileError::Storage(e) => WebhookRejection::Storage(e),
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebhookRejection::InvalidMethod => (StatusCode::BAD_REQUEST, "Invalid method"),
            WebhookRejection::SecretNotSet => {
                (StatusCode::INTERNAL_SERVER_ERROR, "KASPI_SECRET is not set")
            }
            WebhookRejection::InvalidSignature => (StatusCode::FORBIDDEN, "Invalid signature"),
            WebhookRejection::NotFound => {
                (StatusCode::NOT_FOUND, "Payment not found or invalid data")
            }
            WebhookRejection::InvalidAmountFormat => {
                (StatusCode::BAD_REQUEST, "Invalid amount format")
            }
            WebhookRejection::InvalidAmount => (StatusCode::BAD_REQUEST, "Invalid amount"),
            WebhookRejection::InvalidTransition => {
                (StatusCode::CONFLICT, "Invalid status transition")
            }
            WebhookRejection::StorageTimeout => {
                (StatusCode::SERVICE_UNAVAILABLE, "Storage timeout")
            }
            WebhookRejection::Storage(e) => {
                error!("Payment notification failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Handler for `/payment/webhook` (any method)
pub async fn payment_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusBody>, WebhookRejection> {
    if method != Method::POST {
        return Err(WebhookRejection::InvalidMethod);
    }

    let Some(secret) = state.kaspi_secret.as_deref() else {
        error!("Payment notification received but KASPI_SECRET is not set");
        return Err(WebhookRejection::SecretNotSet);
    };

    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !verify_signature(secret, &body, provided) {
        warn!(
            signature_present = !provided.is_empty(),
            body_len = body.len(),
            "Rejected payment notification with invalid signature"
        );
        return Err(WebhookRejection::InvalidSignature);
    }

    let notification = Notification::parse(&body).ok_or(WebhookRejection::NotFound)?;

    bounded(
        "payment reconciliation",
        state.db_timeout,
        reconcile(&state.db, &notification),
    )
    .await?;

    Ok(Json(StatusBody::ok()))
}
