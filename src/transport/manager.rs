//! Connection lifecycle and reconnection policy.
//!
//! [`ConnectionManager`] is a plain state machine. It never performs I/O
//! itself: [`ensure_connected`](ConnectionManager::ensure_connected) hands
//! back the id of an attempt for the runtime to start, transport events are
//! fed in through [`on_event`](ConnectionManager::on_event), and the
//! reconnect timer is a deadline the runtime sleeps towards.
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──ensure_connected──► Connecting ──open──► AuthenticatingPending
//!      ▲                                                          │
//!      │                                                   auth_success
//!      │                                                          ▼
//!      └──────────────── close / error (any state) ──────── Authenticated
//! ```
//!
//! Reconnection is unconditional with a fixed delay and no attempt ceiling.
//! At most one reconnect deadline is pending at any time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::identifiers::ConnectionId;
use crate::protocol::Envelope;

// ============================================================================
// Constants
// ============================================================================

/// Fixed delay before reconnecting after a drop.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5_000);

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the single telemetry connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport.
    #[default]
    Disconnected,
    /// Transport attempt in flight.
    Connecting,
    /// Transport open, waiting for `auth_success`.
    AuthenticatingPending,
    /// Telemetry may flow.
    Authenticated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AuthenticatingPending => "authenticating",
            Self::Authenticated => "authenticated",
        };
        f.write_str(label)
    }
}

// ============================================================================
// TransportEvent
// ============================================================================

/// What happened on a connection attempt.
#[derive(Debug)]
pub enum TransportEventKind {
    /// Transport opened; frames go to the sender.
    Opened(mpsc::UnboundedSender<String>),
    /// Inbound text frame.
    Frame(String),
    /// Transport error, including failure to connect.
    Error(String),
    /// Transport closed.
    Closed,
}

/// A transport event tagged with its attempt.
#[derive(Debug)]
pub struct TransportEvent {
    /// Attempt that produced the event.
    pub id: ConnectionId,
    /// The event.
    pub kind: TransportEventKind,
}

impl TransportEvent {
    /// Creates a tagged event.
    #[inline]
    #[must_use]
    pub const fn new(id: ConnectionId, kind: TransportEventKind) -> Self {
        Self { id, kind }
    }
}

/// Result of feeding a transport event to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// Event was stale or redundant.
    Ignored,
    /// Transport opened; authentication should begin.
    Opened,
    /// Inbound frame on the current connection.
    Frame(String),
    /// Connection dropped; a reconnect is scheduled.
    Disconnected,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owns the single transport connection and its reconnection timer.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Current lifecycle state.
    state: ConnectionState,
    /// Attempt whose events are current.
    current: Option<ConnectionId>,
    /// Last id handed out.
    last_id: ConnectionId,
    /// Outbound queue of the open transport.
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Pending reconnect deadline.
    reconnect_at: Option<Instant>,
    /// Delay between a drop and the reconnect.
    reconnect_delay: Duration,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_DELAY)
    }
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    #[must_use]
    pub const fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            current: None,
            last_id: ConnectionId::new(0),
            outbound: None,
            reconnect_at: None,
            reconnect_delay,
        }
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` once `auth_success` has been accepted.
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == ConnectionState::Authenticated
    }

    /// Returns the pending reconnect deadline.
    #[inline]
    #[must_use]
    pub const fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Starts a connection attempt if disconnected.
    ///
    /// Idempotent: while connecting, authenticating or authenticated this
    /// returns `None`. Otherwise the state becomes `Connecting` and the id
    /// of the attempt to start is returned.
    pub fn ensure_connected(&mut self) -> Option<ConnectionId> {
        if self.state != ConnectionState::Disconnected {
            trace!(state = %self.state, "Connection already in progress");
            return None;
        }

        let id = self.last_id.next();
        self.last_id = id;
        self.current = Some(id);
        self.state = ConnectionState::Connecting;

        debug!(connection_id = %id, "Connecting");
        Some(id)
    }

    /// Feeds a transport event.
    pub fn on_event(&mut self, event: TransportEvent, now: Instant) -> TransportOutcome {
        if self.current != Some(event.id) {
            trace!(connection_id = %event.id, "Ignoring event from stale connection");
            return TransportOutcome::Ignored;
        }

        match event.kind {
            TransportEventKind::Opened(outbound) => {
                if self.state != ConnectionState::Connecting {
                    return TransportOutcome::Ignored;
                }
                self.state = ConnectionState::AuthenticatingPending;
                self.outbound = Some(outbound);
                info!(connection_id = %event.id, "Telemetry transport open");
                TransportOutcome::Opened
            }

            TransportEventKind::Frame(text) => TransportOutcome::Frame(text),

            TransportEventKind::Error(message) => {
                warn!(connection_id = %event.id, error = %message, "Telemetry connection failed");
                self.disconnect(now);
                TransportOutcome::Disconnected
            }

            TransportEventKind::Closed => {
                debug!(connection_id = %event.id, "Telemetry transport closed");
                self.disconnect(now);
                TransportOutcome::Disconnected
            }
        }
    }

    /// Accepts authentication for the open transport.
    ///
    /// Returns `false` unless the manager was waiting for it.
    pub fn mark_authenticated(&mut self) -> bool {
        if self.state != ConnectionState::AuthenticatingPending {
            return false;
        }
        self.state = ConnectionState::Authenticated;
        true
    }

    /// Consumes the reconnect deadline if it has passed.
    ///
    /// Callers follow a `true` with [`ensure_connected`](Self::ensure_connected),
    /// which is a no-op if a connection was re-established meanwhile.
    pub fn reconnect_due(&mut self, now: Instant) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now => {
                self.reconnect_at = None;
                true
            }
            _ => false,
        }
    }

    /// Transmits `envelope` if the state allows it.
    ///
    /// `authenticate` is sent only while authentication is pending; every
    /// other message only once authenticated. Anything else is dropped
    /// silently. Returns `true` if the frame was queued.
    pub fn send(&mut self, envelope: &Envelope) -> bool {
        let allowed = if envelope.message.is_authenticate() {
            self.state == ConnectionState::AuthenticatingPending
        } else {
            self.state == ConnectionState::Authenticated
        };

        if !allowed {
            trace!(kind = envelope.message.kind(), state = %self.state, "Dropping message");
            return false;
        }

        let Some(outbound) = &self.outbound else {
            return false;
        };

        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(kind = envelope.message.kind(), error = %e, "Failed to encode message");
                return false;
            }
        };

        if outbound.send(frame).is_err() {
            debug!(kind = envelope.message.kind(), "Outbound queue closed");
            return false;
        }

        trace!(kind = envelope.message.kind(), "Message sent");
        true
    }

    /// Drops the transport and schedules a reconnect.
    fn disconnect(&mut self, now: Instant) {
        self.state = ConnectionState::Disconnected;
        self.current = None;
        self.outbound = None;

        if self.reconnect_at.is_some() {
            trace!("Reconnect already scheduled");
            return;
        }

        self.reconnect_at = Some(now + self.reconnect_delay);
        debug!(delay_ms = self.reconnect_delay.as_millis() as u64, "Reconnect scheduled");
    }
}

// ============================================================================
// Tests
// ============================================================================
