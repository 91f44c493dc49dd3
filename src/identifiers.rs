//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection attempts and session tokens from being
//! mixed up with plain integers and strings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Fixed prefix of every anonymous token.
pub const TOKEN_PREFIX: &str = "docs";

/// Hex digits of the random token suffix.
const TOKEN_SUFFIX_LEN: usize = 8;

// ============================================================================
// ConnectionId
// ============================================================================

/// Identifies one transport connection attempt.
///
/// Events tagged with a superseded id are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates an id from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id following this one.
    #[inline]
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// AnonymousToken
// ============================================================================

/// Self-asserted, unverified session identifier.
///
/// Format: `docs-<epoch millis>-<8 random lowercase hex digits>`, the hex
/// taken from a v4 UUID. Uniqueness is best effort only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnonymousToken(String);

impl AnonymousToken {
    /// Generates a fresh token stamped with `epoch_millis`.
    #[must_use]
    pub fn generate(epoch_millis: i64) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        let suffix = &random[..TOKEN_SUFFIX_LEN];
        Self(format!("{TOKEN_PREFIX}-{epoch_millis}-{suffix}"))
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonymousToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_next() {
        let id = ConnectionId::new(7);
        assert_eq!(id.next().as_u64(), 8);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_token_format() {
        let token = AnonymousToken::generate(1_700_000_000_123);
        let parts: Vec<&str> = token.as_str().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "docs");
        assert_eq!(parts[1], "1700000000123");
        assert_eq!(parts[2].len(), 8);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_tokens_differ() {
        let a = AnonymousToken::generate(1);
        let b = AnonymousToken::generate(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_serializes_as_string() {
        let token = AnonymousToken::generate(5);
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json.as_str(), Some(token.as_str()));
    }
}
