//! Internal API authentication via timestamp and keyed hash
//!
//! # Architecture
//!
//! Calls to `/api/*` come from the session-holding front end, not from
//! browsers. Every request carries:
//! - `timestamp`: Unix epoch milliseconds
//! - `hash`: hex HMAC-SHA256 of the canonical JSON of every other field,
//!   keyed by the shared API secret
//!
//! POST bodies carry both as JSON fields; GET requests carry them as query
//! parameters, in which case every value is hashed as a JSON string and the
//! request path is covered under a synthetic `path` key, so a signed query
//! cannot be replayed against another resource.
//!
//! The timestamp must be at most [`MAX_PAST_MS`] old and at most
//! [`MAX_FUTURE_MS`] ahead of the server clock.
//!
//! This module contains ONLY pure functions. Framework-specific middleware
//! lives in the service crate.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

use crate::time::now_millis;

/// Field carrying the request hash
pub const HASH_FIELD: &str = "hash";
/// Field carrying the request timestamp
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Synthetic field binding a GET signature to its request path
pub const PATH_FIELD: &str = "path";
/// Oldest accepted request age
pub const MAX_PAST_MS: i64 = 30_000;
/// Allowed clock drift into the future
pub const MAX_FUTURE_MS: i64 = 1_000;

type HmacSha256 = Hmac<Sha256>;

/// Authentication error types
#[derive(Debug, Clone, Error)]
pub enum ApiAuthError {
    /// Timestamp outside acceptable window
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp {
        timestamp: i64,
        now: i64,
        reason: String,
    },

    /// Hash does not match calculated value
    #[error("Invalid hash")]
    InvalidHash,

    /// Timestamp field missing or not an integer
    #[error("Missing timestamp field")]
    MissingTimestamp,

    /// Hash field missing or not a string
    #[error("Missing hash field")]
    MissingHash,
}

/// Validate a request timestamp against the current clock
pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, now_millis())
}

/// Validate a request timestamp against an explicit `now`
///
/// # Examples
///
/// ```
/// use lms_common::api::auth::validate_timestamp_at;
///
/// let now = 1_730_000_000_000;
/// assert!(validate_timestamp_at(now - 500, now).is_ok());
/// assert!(validate_timestamp_at(now - 60_000, now).is_err());
/// assert!(validate_timestamp_at(now + 5_000, now).is_err());
/// ```
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    // Caller-controlled; extreme values saturate and fail the window check
    let diff = now.saturating_sub(timestamp);

    if diff > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", diff, MAX_PAST_MS),
        });
    }

    if diff < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                diff.unsigned_abs(),
                MAX_FUTURE_MS
            ),
        });
    }

    Ok(())
}

/// Pull the timestamp out of a request object
///
/// Accepts a JSON integer (POST bodies) or a decimal string (GET queries).
pub fn extract_timestamp(request: &Value) -> Result<i64, ApiAuthError> {
    match request.get(TIMESTAMP_FIELD) {
        Some(Value::Number(n)) => n.as_i64().ok_or(ApiAuthError::MissingTimestamp),
        Some(Value::String(s)) => s.parse::<i64>().map_err(|_| ApiAuthError::MissingTimestamp),
        _ => Err(ApiAuthError::MissingTimestamp),
    }
}

/// Pull the hash out of a request object
pub fn extract_hash(request: &Value) -> Result<&str, ApiAuthError> {
    request
        .get(HASH_FIELD)
        .and_then(Value::as_str)
        .ok_or(ApiAuthError::MissingHash)
}

/// Convert JSON to canonical form (sorted keys, no whitespace)
///
/// # Examples
///
/// ```
/// use lms_common::api::auth::to_canonical_json;
/// use serde_json::json;
///
/// let canonical = to_canonical_json(&json!({"z": 3, "a": [1, "x"], "m": null}));
/// assert_eq!(canonical, r#"{"a":[1,"x"],"m":null,"z":3}"#);
/// ```
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by_key(|(k, _)| *k);
            let items: Vec<String> = pairs
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), to_canonical_json(v)))
                .collect();
            format!("{{{}}}", items.join(","))
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // serde_json's own rendering handles escaping for scalars
        scalar => scalar.to_string(),
    }
}

/// Calculate the request hash
///
/// The `hash` field itself is excluded; every other field, including
/// `timestamp`, is covered.
pub fn calculate_hash(request: &Value, secret: &str) -> String {
    hex::encode(mac_over(request, secret).finalize().into_bytes())
}

/// Validate a provided hash in constant time
pub fn validate_hash(provided: &str, request: &Value, secret: &str) -> Result<(), ApiAuthError> {
    let provided_bytes = hex::decode(provided.trim()).map_err(|_| ApiAuthError::InvalidHash)?;
    mac_over(request, secret)
        .verify_slice(&provided_bytes)
        .map_err(|_| ApiAuthError::InvalidHash)
}

/// Validate timestamp and hash of a full request object
pub fn authenticate_request(request: &Value, secret: &str) -> Result<(), ApiAuthError> {
    let timestamp = extract_timestamp(request)?;
    let hash = extract_hash(request)?;
    validate_timestamp(timestamp)?;
    validate_hash(hash, request, secret)
}

/// Stamp and sign a request object in place (client side)
///
/// # Examples
///
/// ```
/// use lms_common::api::auth::{authenticate_request, sign_request};
/// use lms_common::time::now_millis;
/// use serde_json::json;
///
/// let mut body = json!({"user_id": 7, "course_slug": "rust-101"});
/// sign_request(&mut body, "internal", now_millis());
/// assert!(authenticate_request(&body, "internal").is_ok());
/// ```
pub fn sign_request(request: &mut Value, secret: &str, timestamp: i64) {
    if let Some(obj) = request.as_object_mut() {
        obj.insert(TIMESTAMP_FIELD.to_string(), Value::from(timestamp));
        obj.remove(HASH_FIELD);
    }
    let hash = calculate_hash(request, secret);
    if let Some(obj) = request.as_object_mut() {
        obj.insert(HASH_FIELD.to_string(), Value::String(hash));
    }
}

fn mac_over(request: &Value, secret: &str) -> HmacSha256 {
    let mut unsigned = request.clone();
    if let Some(obj) = unsigned.as_object_mut() {
        obj.remove(HASH_FIELD);
    }

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(to_canonical_json(&unsigned).as_bytes());
    mac
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_window() {
        let now = 1_730_000_000_000;
        assert!(validate_timestamp_at(now, now).is_ok());
        assert!(validate_timestamp_at(now - MAX_PAST_MS, now).is_ok());
        assert!(validate_timestamp_at(now - MAX_PAST_MS - 1, now).is_err());
        assert!(validate_timestamp_at(now + MAX_FUTURE_MS, now).is_ok());
        assert!(validate_timestamp_at(now + MAX_FUTURE_MS + 1, now).is_err());
    }

    #[test]
    fn test_extreme_timestamps_rejected_without_overflow() {
        let now = 1_730_000_000_000;
        assert!(validate_timestamp_at(i64::MIN, now).is_err());
        assert!(validate_timestamp_at(i64::MAX, now).is_err());
        assert!(validate_timestamp_at(0, i64::MIN).is_err());
        assert!(validate_timestamp_at(i64::MIN, i64::MAX).is_err());
    }

    #[test]
    fn test_hash_excludes_hash_field() {
        let a = json!({"user_id": 1, "timestamp": 5, "hash": "x"});
        let b = json!({"user_id": 1, "timestamp": 5, "hash": "y"});
        assert_eq!(calculate_hash(&a, "k"), calculate_hash(&b, "k"));
    }

    #[test]
    fn test_hash_depends_on_secret_and_fields() {
        let req = json!({"user_id": 1, "timestamp": 5});
        let h1 = calculate_hash(&req, "k1");
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, calculate_hash(&req, "k2"));
        assert_ne!(h1, calculate_hash(&json!({"user_id": 2, "timestamp": 5}), "k1"));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":2,"timestamp":9}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"timestamp":9,"a":2,"b":1}"#).unwrap();
        assert_eq!(calculate_hash(&a, "k"), calculate_hash(&b, "k"));
    }

    #[test]
    fn test_canonical_json_escapes_strings() {
        let canonical = to_canonical_json(&json!({"q": "a\"b\n"}));
        assert_eq!(canonical, r#"{"q":"a\"b\n"}"#);
    }

    #[test]
    fn test_signed_request_round_trip() {
        let mut req = json!({"course_slug": "rust-101", "user_id": 3});
        sign_request(&mut req, "internal", now_millis());
        assert!(authenticate_request(&req, "internal").is_ok());
        assert!(matches!(
            authenticate_request(&req, "wrong"),
            Err(ApiAuthError::InvalidHash)
        ));
    }

    #[test]
    fn test_tampered_request_rejected() {
        let mut req = json!({"user_id": 3});
        sign_request(&mut req, "internal", now_millis());
        req["user_id"] = json!(4);
        assert!(matches!(
            authenticate_request(&req, "internal"),
            Err(ApiAuthError::InvalidHash)
        ));
    }

    #[test]
    fn test_query_string_timestamp_accepted() {
        let req = json!({"timestamp": "1730000000000"});
        assert_eq!(extract_timestamp(&req).unwrap(), 1_730_000_000_000);
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            authenticate_request(&json!({"hash": "00"}), "k"),
            Err(ApiAuthError::MissingTimestamp)
        ));
        assert!(matches!(
            authenticate_request(&json!({"timestamp": 1}), "k"),
            Err(ApiAuthError::MissingHash)
        ));
    }

    #[test]
    fn test_non_hex_hash_rejected() {
        let req = json!({"timestamp": now_millis(), "hash": "zz"});
        assert!(matches!(
            authenticate_request(&req, "k"),
            Err(ApiAuthError::InvalidHash)
        ));
    }
}
