//! Session context and authentication.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionContext`] | Visitor facts and the per-connection token |
//! | [`PageVisitContext`] | The page currently being measured |
//! | [`Handshake`] | Gates telemetry on `auth_success` |

/// Session and page-visit context.
pub mod context;

/// Anonymous authentication handshake.
pub mod handshake;

pub use context::{PageVisitContext, SessionContext};
pub use handshake::{Handshake, HandshakeOutcome};
