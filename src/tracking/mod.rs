//! Engagement measurement and telemetry emission.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EngagementTracker`] | Scroll depth and clicks for the current page |
//! | [`EventEmitter`] | Builds and dispatches telemetry messages |
//! | [`Heartbeat`] | Fixed-interval `session_update` timer |
//! | [`NavigationWatcher`] | Detects page transitions |

/// Message assembly and heartbeat.
pub mod emitter;

/// Scroll and click accumulation.
pub mod engagement;

/// Page transition detection.
pub mod navigation;

pub use emitter::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_LINK_TEXT_LIMIT, EventEmitter, Heartbeat};
pub use engagement::{
    Anchor, Click, DEFAULT_SCROLL_DEBOUNCE, EngagementState, EngagementTracker, ScrollSample,
};
pub use navigation::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, NavigationTrigger, NavigationWatcher,
};
