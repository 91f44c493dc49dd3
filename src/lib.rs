//! Docs Beacon - Resilient WebSocket telemetry for documentation sites.
//!
//! This library measures how visitors use a documentation site and streams
//! anonymous telemetry to a collector over a single WebSocket connection.
//!
//! # Architecture
//!
//! The beacon follows a single-owner model:
//!
//! - **Host (page bridge)**: Reports lifecycle and interaction signals
//! - **Runtime (one task)**: Owns every component, reacts to signals,
//!   transport events and timers
//! - **Collector (remote)**: Acknowledges the anonymous token, receives events
//!
//! Key design principles:
//!
//! - Telemetry is installed in production only
//! - Nothing but `authenticate` is sent before `auth_success`
//! - Dropped connections reconnect after a fixed delay, one attempt at a time
//! - Telemetry is best effort: messages sent while unauthenticated are dropped
//!
//! # Quick Start
//!
//! ```no_run
//! use docs_beacon::{Beacon, Click, DeploymentMode, PageState, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let page = PageState::new("https://docs.gpuflow.app/guides/")?;
//!     page.set_title("Guides");
//!
//!     let beacon = Beacon::builder()
//!         .site("docs")
//!         .mode(DeploymentMode::from_env())
//!         .build()?;
//!
//!     let handle = beacon.install(page.clone())?;
//!     handle.document_ready();
//!
//!     // Forward host events as they happen.
//!     page.navigate("/renters/")?;
//!     handle.navigated();
//!     handle.clicked(Click::on_link("https://github.com/gpuflow", "GitHub"));
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`beacon`] | Configuration, installation, host handle |
//! | [`clock`] | Wall-clock timestamps |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | Host page trait and in-memory page |
//! | [`identifiers`] | Connection ids and anonymous tokens |
//! | [`protocol`] | Wire message types |
//! | [`session`] | Session context and authentication |
//! | [`tracking`] | Engagement, navigation, heartbeat |
//! | [`transport`] | WebSocket transport and connection state |

// ============================================================================
// Modules
// ============================================================================

/// Beacon configuration and installation.
///
/// Use [`Beacon::builder()`] to create a configured beacon.
pub mod beacon;

/// Wall-clock timestamps.
pub mod clock;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host page collaborator.
pub mod host;

/// Type-safe identifiers.
pub mod identifiers;

/// Telemetry wire protocol.
pub mod protocol;

/// Session context and authentication handshake.
pub mod session;

/// Engagement measurement and emission.
pub mod tracking;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Beacon types
pub use beacon::{
    Beacon, BeaconBuilder, BeaconHandle, BeaconOptions, DeploymentMode, HostSignal,
};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{Host, Location, PageState, Viewport};

// Identifier types
pub use identifiers::{AnonymousToken, ConnectionId};

// Protocol types
pub use protocol::{Envelope, TelemetryMessage};

// Tracking types
pub use tracking::{Anchor, Click, EngagementState, ScrollSample};

// Transport types
pub use transport::{ConnectionState, Connector, Link, LinkEvent, LinkPeer, WebSocketConnector};
