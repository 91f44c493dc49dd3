//! Anonymous authentication handshake.
//!
//! On every transport open a fresh token is presented with `authenticate`.
//! The first `auth_success` on that connection unlocks telemetry. No timeout
//! applies: without an acknowledgement the connection simply stays
//! unauthenticated until it drops.

use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::protocol::{Envelope, InboundMessage, TelemetryMessage};
use crate::transport::ConnectionManager;

use super::SessionContext;

// ============================================================================
// HandshakeOutcome
// ============================================================================

/// Result of feeding an inbound frame to the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Authentication completed on this frame.
    Authenticated,
    /// Duplicate `auth_success` on an authenticated connection.
    AlreadyAuthenticated,
    /// Frame of another type, or not expected in the current state.
    Ignored,
    /// Frame was not valid JSON with a `type`.
    Malformed,
}

// ============================================================================
// Handshake
// ============================================================================

/// Tracks authentication of the current connection.
#[derive(Debug, Default)]
pub struct Handshake {
    /// Whether the current connection was acknowledged.
    authenticated: bool,
}

impl Handshake {
    /// Creates a handshake for a new connection.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            authenticated: false,
        }
    }

    /// Presents a freshly generated token on a newly opened transport.
    ///
    /// Returns `true` if `authenticate` was queued.
    pub fn begin(
        &mut self,
        session: &mut SessionContext,
        manager: &mut ConnectionManager,
        clock: &Clock,
        now: Instant,
    ) -> bool {
        self.authenticated = false;

        let timestamp = clock.epoch_millis(now);
        let token = session.regenerate_token(timestamp).clone();
        debug!(token = %token, "Authenticating");

        manager.send(&Envelope::new(
            TelemetryMessage::Authenticate(token),
            timestamp,
        ))
    }

    /// Handles an inbound frame.
    ///
    /// Malformed frames are dropped. Only `auth_success` is interpreted.
    pub fn on_frame(&mut self, text: &str, manager: &mut ConnectionManager) -> HandshakeOutcome {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Dropping malformed frame");
                return HandshakeOutcome::Malformed;
            }
        };

        if !message.is_auth_success() {
            trace!(kind = %message.kind, "Ignoring inbound message");
            return HandshakeOutcome::Ignored;
        }

        if self.authenticated {
            return HandshakeOutcome::AlreadyAuthenticated;
        }

        if !manager.mark_authenticated() {
            return HandshakeOutcome::Ignored;
        }

        self.authenticated = true;
        info!("Telemetry authenticated");
        HandshakeOutcome::Authenticated
    }

    /// Forgets authentication after the transport drops.
    #[inline]
    pub fn reset(&mut self) {
        self.authenticated = false;
    }
}

// ============================================================================
// Tests
// ============================================================================
