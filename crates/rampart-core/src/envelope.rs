//! Response envelopes.
//!
//! Every response body has one of two shapes:
//!
//! ```text
//! success: {"statusCode": 200, "message": "", "data": <handler data>}
//! error:   {"status": <int>, "message": <string>, "data": {}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wrapper for successful handler output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    /// Always 200.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Always empty.
    pub message: String,
    /// The data the handler produced.
    pub data: Value,
}

impl SuccessEnvelope {
    /// Wraps handler data.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            status_code: 200,
            message: String::new(),
            data,
        }
    }
}

/// Wrapper for every failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The response status.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// Always an empty object.
    pub data: Map<String, Value>,
}

impl ErrorEnvelope {
    /// Creates an error envelope with empty data.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_wire_shape() {
        let envelope = SuccessEnvelope::new(json!({"id": 42}));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"statusCode": 200, "message": "", "data": {"id": 42}})
        );
    }

    #[test]
    fn test_error_envelope_wire_shape() {
        let envelope = ErrorEnvelope::new(403, "forbidden resource");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": 403, "message": "forbidden resource", "data": {}})
        );
    }
}
