//! Inbound frames from the collector.
//!
//! Only the `type` field is interpreted. Everything else a frame carries
//! belongs to server-side features the beacon does not implement.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Type tag acknowledging authentication.
pub const AUTH_SUCCESS: &str = "auth_success";

// ============================================================================
// InboundMessage
// ============================================================================

/// A frame received from the collector.
///
/// # Format
///
/// ```json
/// { "type": "auth_success", ... }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,

    /// Optional payload, kept opaque.
    #[serde(default)]
    pub data: Option<Value>,
}

impl InboundMessage {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the frame is not a JSON object with
    /// a string `type`.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns `true` if this acknowledges authentication.
    #[inline]
    #[must_use]
    pub fn is_auth_success(&self) -> bool {
        self.kind == AUTH_SUCCESS
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_success() {
        let message = InboundMessage::parse(r#"{"type":"auth_success"}"#).unwrap();
        assert!(message.is_auth_success());
        assert!(message.data.is_none());
    }

    #[test]
    fn test_parse_other_type_with_payload() {
        let message =
            InboundMessage::parse(r#"{"type":"notification","data":{"n":1},"extra":true}"#)
                .unwrap();
        assert_eq!(message.kind, "notification");
        assert!(!message.is_auth_success());
    }

    #[test]
    fn test_malformed_frames_error() {
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse(r#"{"data":1}"#).is_err());
        assert!(InboundMessage::parse(r#"{"type":5}"#).is_err());
        assert!(InboundMessage::parse("[]").is_err());
    }
}
