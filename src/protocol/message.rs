//! Outbound telemetry messages.
//!
//! # Format
//!
//! ```json
//! {
//!   "type": "page_visit",
//!   "data": { "url": "/guides/", "title": "Guides", ... },
//!   "timestamp": 1700000000123
//! }
//! ```
//!
//! `authenticate` carries the bare token string as `data`.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Result;
use crate::host::Viewport;
use crate::identifiers::AnonymousToken;

// ============================================================================
// TelemetryMessage
// ============================================================================

/// All messages the beacon sends, tagged by `type` with payload in `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TelemetryMessage {
    /// Anonymous authentication request.
    Authenticate(AnonymousToken),
    /// Once per authenticated connection.
    SessionStart(SessionStart),
    /// A page was entered.
    PageVisit(PageVisit),
    /// A page was left.
    PageLeave(PageLeave),
    /// Heartbeat with live engagement.
    SessionUpdate(SessionUpdate),
    /// An anchor was clicked.
    DocsLinkClick(LinkClick),
}

impl TelemetryMessage {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::SessionStart(_) => "session_start",
            Self::PageVisit(_) => "page_visit",
            Self::PageLeave(_) => "page_leave",
            Self::SessionUpdate(_) => "session_update",
            Self::DocsLinkClick(_) => "docs_link_click",
        }
    }

    /// Returns `true` for the only message allowed before authentication.
    #[inline]
    #[must_use]
    pub const fn is_authenticate(&self) -> bool {
        matches!(self, Self::Authenticate(_))
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A message stamped with its transmission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// The message.
    #[serde(flatten)]
    pub message: TelemetryMessage,

    /// Milliseconds since the Unix epoch at send time.
    pub timestamp: i64,
}

impl Envelope {
    /// Stamps `message` with `timestamp`.
    #[inline]
    #[must_use]
    pub const fn new(message: TelemetryMessage, timestamp: i64) -> Self {
        Self { message, timestamp }
    }

    /// Serializes to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Payload of `session_start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    /// Site identifier.
    pub site: String,
    /// ISO-8601 session start time.
    pub session_start: String,
    /// Browser user agent.
    pub user_agent: String,
    /// Viewport at session start.
    pub viewport: Viewport,
    /// Visitor timezone.
    pub timezone: String,
    /// Visitor locale.
    pub language: String,
}

/// Payload of `page_visit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVisit {
    /// Path and query of the page entered.
    pub url: String,
    /// Document title.
    pub title: String,
    /// Document referrer.
    pub referrer: String,
    /// Site identifier.
    pub site: String,
    /// Browser user agent.
    pub user_agent: String,
    /// Current viewport.
    pub viewport: Viewport,
}

/// Payload of `page_leave`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLeave {
    /// Path of the page left.
    pub url: String,
    /// Site identifier.
    pub site: String,
    /// Milliseconds spent on the page.
    pub duration: u64,
    /// Deepest scroll reached, in percent.
    pub scroll_depth: u8,
    /// Clicks counted on the page.
    pub clicks: u32,
}

/// Payload of `session_update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    /// Site identifier.
    pub site: String,
    /// Path of the current page.
    pub page: String,
    /// Milliseconds on the current page.
    pub time_on_page: u64,
    /// Deepest scroll reached so far, in percent.
    pub scroll_depth: u8,
    /// Clicks counted so far.
    pub clicks: u32,
    /// Milliseconds since the session started.
    pub session_duration: u64,
}

/// Payload of `docs_link_click`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkClick {
    /// Raw `href` of the anchor.
    pub href: String,
    /// Link text, truncated.
    pub text: String,
    /// Whether the target is on another host.
    pub is_external: bool,
    /// First path segment of the page the click happened on.
    pub section: String,
    /// Site identifier.
    pub site: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    fn encode(message: TelemetryMessage) -> Value {
        let frame = Envelope::new(message, 1_700_000_000_000).to_frame().unwrap();
        serde_json::from_str(&frame).unwrap()
    }

    #[test]
    fn test_authenticate_data_is_token_string() {
        let token = AnonymousToken::generate(1);
        let value = encode(TelemetryMessage::Authenticate(token.clone()));

        assert_eq!(value["type"], "authenticate");
        assert_eq!(value["data"], json!(token.as_str()));
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_page_leave_shape() {
        let value = encode(TelemetryMessage::PageLeave(PageLeave {
            url: "/a".into(),
            site: "docs".into(),
            duration: 1200,
            scroll_depth: 40,
            clicks: 3,
        }));

        assert_eq!(
            value,
            json!({
                "type": "page_leave",
                "data": {
                    "url": "/a",
                    "site": "docs",
                    "duration": 1200,
                    "scrollDepth": 40,
                    "clicks": 3
                },
                "timestamp": 1_700_000_000_000_i64
            })
        );
    }

    #[test]
    fn test_session_start_field_names() {
        let value = encode(TelemetryMessage::SessionStart(SessionStart {
            site: "docs".into(),
            session_start: "2025-03-01T12:00:00.000Z".into(),
            user_agent: "ua".into(),
            viewport: Viewport::new(800, 600),
            timezone: "Europe/Berlin".into(),
            language: "de-DE".into(),
        }));

        let data = &value["data"];
        assert_eq!(data["sessionStart"], "2025-03-01T12:00:00.000Z");
        assert_eq!(data["userAgent"], "ua");
        assert_eq!(data["viewport"], json!({ "width": 800, "height": 600 }));
        assert_eq!(data["language"], "de-DE");
    }

    #[test]
    fn test_link_click_field_names() {
        let value = encode(TelemetryMessage::DocsLinkClick(LinkClick {
            href: "https://other.example/x".into(),
            text: "Other".into(),
            is_external: true,
            section: "guides".into(),
            site: "docs".into(),
        }));

        assert_eq!(value["type"], "docs_link_click");
        assert_eq!(value["data"]["isExternal"], true);
        assert_eq!(value["data"]["section"], "guides");
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let message = TelemetryMessage::SessionUpdate(SessionUpdate {
            site: "docs".into(),
            page: "/".into(),
            time_on_page: 0,
            scroll_depth: 0,
            clicks: 0,
            session_duration: 0,
        });
        let kind = message.kind();
        assert_eq!(encode(message)["type"], kind);
    }
}
