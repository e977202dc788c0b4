//! Authentication middleware for the internal API
//!
//! Wraps the pure timestamp + HMAC checks from `lms_common::api::auth`.
//! POST requests are authenticated from their JSON body; GET requests from
//! their query string plus the request path.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use lms_common::api::auth::{authenticate_request, ApiAuthError, PATH_FIELD};
use lms_common::api::ErrorBody;
use serde_json::{Map, Value};
use tracing::warn;

use crate::AppState;

/// Largest request body read for hash validation
pub const MAX_AUTH_BODY_BYTES: usize = 1024 * 1024;

/// Authentication middleware
///
/// Applied to `/api/*` data routes only. `/health`, `/api/buildinfo` and the
/// payment webhook are public; the webhook carries its own signature.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(secret) = state.api_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    if request.method() == Method::GET {
        let signed = query_request_object(&request)?;
        authenticate_request(&signed, secret).map_err(|e| reject(e, request.uri().path()))?;
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_AUTH_BODY_BYTES)
        .await
        .map_err(|e| AuthError::ParseError(format!("Failed to read body: {}", e)))?;

    let json_value: Value = serde_json::from_slice(&body_bytes)
        .map_err(|e| AuthError::ParseError(format!("Invalid JSON: {}", e)))?;
    if !json_value.is_object() {
        return Err(AuthError::ParseError("Body must be a JSON object".to_string()));
    }

    authenticate_request(&json_value, secret).map_err(|e| reject(e, parts.uri.path()))?;

    // Downstream extractors need the body back
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

/// Query parameters as a JSON object of strings, plus the request path
fn query_request_object(request: &Request) -> Result<Value, AuthError> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri())
        .map_err(|e| AuthError::ParseError(format!("Invalid query string: {}", e)))?;

    let mut obj: Map<String, Value> = params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    obj.insert(
        PATH_FIELD.to_string(),
        Value::String(request.uri().path().to_string()),
    );
    Ok(Value::Object(obj))
}

fn reject(err: ApiAuthError, path: &str) -> AuthError {
    match err {
        ApiAuthError::InvalidTimestamp { reason, .. } => {
            warn!(path, "Rejected request: {}", reason);
            AuthError::InvalidTimestamp(reason)
        }
        ApiAuthError::InvalidHash => {
            warn!(path, "Rejected request: hash mismatch");
            AuthError::InvalidHash
        }
        ApiAuthError::MissingTimestamp | ApiAuthError::MissingHash => {
            AuthError::MissingFields(err.to_string())
        }
    }
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    InvalidTimestamp(String),
    InvalidHash,
    MissingFields(String),
    ParseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::InvalidTimestamp(reason) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid timestamp: {}", reason))
            }
            AuthError::InvalidHash => (StatusCode::UNAUTHORIZED, "Invalid hash".to_string()),
            AuthError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing required fields: {}", msg))
            }
            AuthError::ParseError(msg) => (StatusCode::BAD_REQUEST, format!("Parse error: {}", msg)),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
