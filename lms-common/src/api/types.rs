//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Flat error body returned by every endpoint: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Acknowledgement body: `{"status": "ok"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let json = serde_json::to_string(&ErrorBody::new("Invalid signature")).unwrap();
        assert_eq!(json, r#"{"error":"Invalid signature"}"#);
    }

    #[test]
    fn test_status_body_shape() {
        let json = serde_json::to_string(&StatusBody::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }
}
