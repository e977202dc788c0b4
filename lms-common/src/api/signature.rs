//! Payment gateway webhook signatures
//!
//! The gateway signs the exact raw request body with HMAC-SHA256 keyed by a
//! shared secret and sends the hex digest in `X-Kaspi-Signature`.
//! Verification never parses the body first: the bytes that were signed are
//! the bytes that get checked.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the hex-encoded body signature
pub const SIGNATURE_HEADER: &str = "X-Kaspi-Signature";

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}

/// Hex HMAC-SHA256 of `body` keyed by `secret`
///
/// # Examples
///
/// ```
/// use lms_common::api::signature::sign_payload;
///
/// let sig = sign_payload("secret", br#"{"invoiceId":"QR1"}"#);
/// assert_eq!(sig.len(), 64);
/// ```
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = keyed_mac(secret.as_bytes());
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a supplied signature header against the body
///
/// Returns `false` for empty, non-hex, wrong-length or mismatching
/// signatures. The digest comparison runs in constant time.
///
/// # Examples
///
/// ```
/// use lms_common::api::signature::{sign_payload, verify_signature};
///
/// let body = br#"{"invoiceId":"QR1","status":"success","amount":100.0}"#;
/// let sig = sign_payload("secret", body);
/// assert!(verify_signature("secret", body, &sig));
/// assert!(!verify_signature("other", body, &sig));
/// assert!(!verify_signature("secret", body, "garbage"));
/// ```
pub fn verify_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let provided = provided.trim();
    if provided.is_empty() {
        return false;
    }

    let Ok(provided_bytes) = hex::decode(provided) else {
        return false;
    };

    let mut mac = keyed_mac(secret.as_bytes());
    mac.update(body);
    mac.verify_slice(&provided_bytes).is_ok()
}
