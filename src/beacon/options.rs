//! Beacon timing options and deployment mode.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use docs_beacon::BeaconOptions;
//!
//! let options = BeaconOptions::new()
//!     .with_heartbeat_interval(Duration::from_secs(30))
//!     .with_reconnect_delay(Duration::from_secs(10));
//!
//! assert_eq!(options.poll_interval, Duration::from_secs(1));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::fmt;
use std::time::Duration;

use crate::tracking::{
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_LINK_TEXT_LIMIT, DEFAULT_POLL_INTERVAL,
    DEFAULT_SCROLL_DEBOUNCE, DEFAULT_SETTLE_DELAY,
};
use crate::transport::DEFAULT_RECONNECT_DELAY;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable selecting the deployment mode.
pub const MODE_ENV_VAR: &str = "DOCS_BEACON_ENV";

// ============================================================================
// DeploymentMode
// ============================================================================

/// Where the site is running.
///
/// Telemetry is installed only in [`DeploymentMode::Production`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeploymentMode {
    /// Local development, previews, tests.
    #[default]
    Development,
    /// The published site.
    Production,
}

impl DeploymentMode {
    /// Parses a mode label. Anything but `production`/`prod` is development.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Reads the mode from [`MODE_ENV_VAR`], defaulting to development.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(MODE_ENV_VAR)
            .map(|label| Self::from_label(&label))
            .unwrap_or_default()
    }

    /// Returns `true` for production.
    #[inline]
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

// ============================================================================
// BeaconOptions
// ============================================================================

/// Timers and limits of the beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconOptions {
    /// Delay before reconnecting after a drop.
    pub reconnect_delay: Duration,

    /// Interval between heartbeats.
    pub heartbeat_interval: Duration,

    /// Interval of the fallback path poll.
    pub poll_interval: Duration,

    /// Delay between a navigation signal and its evaluation.
    pub settle_delay: Duration,

    /// Window after a page change in which a navigation signal to the same
    /// path is a duplicate.
    pub dedupe_window: Duration,

    /// Quiet period before a scroll burst is evaluated.
    pub scroll_debounce: Duration,

    /// Maximum characters of link text reported.
    pub link_text_limit: usize,
}

impl Default for BeaconOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BeaconOptions {
    /// Creates options with the standard timings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            dedupe_window: DEFAULT_SETTLE_DELAY,
            scroll_debounce: DEFAULT_SCROLL_DEBOUNCE,
            link_text_limit: DEFAULT_LINK_TEXT_LIMIT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BeaconOptions {
    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the path poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the navigation settle delay.
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the navigation dedupe window.
    #[inline]
    #[must_use]
    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    /// Sets the scroll debounce.
    #[inline]
    #[must_use]
    pub fn with_scroll_debounce(mut self, debounce: Duration) -> Self {
        self.scroll_debounce = debounce;
        self
    }

    /// Sets the link text limit.
    #[inline]
    #[must_use]
    pub fn with_link_text_limit(mut self, limit: usize) -> Self {
        self.link_text_limit = limit;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl BeaconOptions {
    /// Names the first timer that is zero, if any.
    ///
    /// Zero-length intervals would spin the runtime loop.
    pub(crate) fn zero_timer(&self) -> Option<&'static str> {
        [
            ("reconnect_delay", self.reconnect_delay),
            ("heartbeat_interval", self.heartbeat_interval),
            ("poll_interval", self.poll_interval),
        ]
        .into_iter()
        .find(|(_, value)| value.is_zero())
        .map(|(name, _)| name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BeaconOptions::default();
        assert_eq!(options.reconnect_delay, Duration::from_millis(5_000));
        assert_eq!(options.heartbeat_interval, Duration::from_millis(15_000));
        assert_eq!(options.poll_interval, Duration::from_millis(1_000));
        assert_eq!(options.settle_delay, Duration::from_millis(100));
        assert_eq!(options.dedupe_window, Duration::from_millis(100));
        assert_eq!(options.scroll_debounce, Duration::from_millis(100));
        assert_eq!(options.link_text_limit, 50);
    }

    #[test]
    fn test_builder_chaining() {
        let options = BeaconOptions::new()
            .with_poll_interval(Duration::from_millis(250))
            .with_settle_delay(Duration::from_millis(50))
            .with_dedupe_window(Duration::from_millis(750))
            .with_link_text_limit(20);

        assert_eq!(options.poll_interval, Duration::from_millis(250));
        assert_eq!(options.settle_delay, Duration::from_millis(50));
        assert_eq!(options.dedupe_window, Duration::from_millis(750));
        assert_eq!(options.link_text_limit, 20);
    }

    #[test]
    fn test_zero_timer() {
        assert_eq!(BeaconOptions::new().zero_timer(), None);
        let options = BeaconOptions::new().with_poll_interval(Duration::ZERO);
        assert_eq!(options.zero_timer(), Some("poll_interval"));
    }

    #[test]
    fn test_mode_from_label() {
        assert_eq!(DeploymentMode::from_label("production"), DeploymentMode::Production);
        assert_eq!(DeploymentMode::from_label(" PROD "), DeploymentMode::Production);
        assert_eq!(DeploymentMode::from_label("development"), DeploymentMode::Development);
        assert_eq!(DeploymentMode::from_label("staging"), DeploymentMode::Development);
        assert_eq!(DeploymentMode::from_label(""), DeploymentMode::Development);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(DeploymentMode::Production.to_string(), "production");
        assert!(!DeploymentMode::default().is_production());
    }
}
