//! Telemetry wire protocol.
//!
//! Frames are UTF-8 JSON text.
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `authenticate` | Beacon → Collector | Present anonymous token |
//! | `auth_success` | Collector → Beacon | Acknowledge token |
//! | `session_start` | Beacon → Collector | Session metadata |
//! | `page_visit` | Beacon → Collector | Page entered |
//! | `page_leave` | Beacon → Collector | Page left, with engagement |
//! | `session_update` | Beacon → Collector | Heartbeat |
//! | `docs_link_click` | Beacon → Collector | Anchor clicked |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Outbound messages and envelope |
//! | `inbound` | Inbound frame parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame parsing.
pub mod inbound;

/// Outbound telemetry messages.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::{AUTH_SUCCESS, InboundMessage};
pub use message::{
    Envelope, LinkClick, PageLeave, PageVisit, SessionStart, SessionUpdate, TelemetryMessage,
};
