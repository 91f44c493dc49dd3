//! Telemetry transport layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                       ┌─────────────────┐
//! │  Beacon runtime      │                       │  Collector      │
//! │                      │       WebSocket       │                 │
//! │  ConnectionManager   │◄─────────────────────►│  /ws/client     │
//! │  → Link (pump task)  │      wss://...        │                 │
//! └──────────────────────┘                       └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ConnectionManager::ensure_connected` - Allocate an attempt id
//! 2. `Connector::connect` - Open the transport in the background
//! 3. `TransportEvent` - Open, frames and close flow back to the runtime
//! 4. Drop or error - Schedule one reconnect after a fixed delay
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Links, connectors, WebSocket pump |
//! | `manager` | Connection state machine and reconnect policy |

// ============================================================================
// Submodules
// ============================================================================

/// Links, connectors and the WebSocket pump.
pub mod connection;

/// Connection state machine.
pub mod manager;

// ============================================================================
// Re-exports
// ============================================================================

pub(crate) use connection::spawn_attempt;
pub use connection::{Connector, Link, LinkEvent, LinkPeer, WebSocketConnector};
pub use manager::{
    ConnectionManager, ConnectionState, DEFAULT_RECONNECT_DELAY, TransportEvent,
    TransportEventKind, TransportOutcome,
};
