//! Engagement tracking.
//!
//! Accumulates scroll depth and click count for the page currently being
//! measured. Scroll samples are debounced: only the last sample of a burst
//! is evaluated, once the page has been quiet for the debounce period.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

// ============================================================================
// Constants
// ============================================================================

/// Quiet period before a scroll burst is evaluated.
pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(100);

// ============================================================================
// ScrollSample
// ============================================================================

/// Scroll geometry at one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    /// Vertical scroll offset.
    pub offset: f64,
    /// Full document height.
    pub document_height: f64,
    /// Viewport height.
    pub viewport_height: f64,
}

impl ScrollSample {
    /// Creates a sample.
    #[inline]
    #[must_use]
    pub const fn new(offset: f64, document_height: f64, viewport_height: f64) -> Self {
        Self {
            offset,
            document_height,
            viewport_height,
        }
    }

    /// Scroll depth in percent, clamped to `0..=100`.
    ///
    /// Non-finite and negative ratios (no scrollable area, overscroll above
    /// the top) count as 0.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let scrollable = self.document_height - self.viewport_height;
        let percent = (self.offset / scrollable * 100.0).round();
        if !percent.is_finite() || percent <= 0.0 {
            0
        } else if percent >= 100.0 {
            100
        } else {
            percent as u8
        }
    }
}

// ============================================================================
// Click
// ============================================================================

/// An anchor element with an `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Raw `href` attribute.
    pub href: String,
    /// Text content of the link.
    pub text: String,
}

impl Anchor {
    /// Creates an anchor.
    #[inline]
    #[must_use]
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// A click anywhere in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Click {
    /// Set when the click landed on an anchor with an `href`.
    pub anchor: Option<Anchor>,
}

impl Click {
    /// A click on something other than a link.
    #[inline]
    #[must_use]
    pub const fn plain() -> Self {
        Self { anchor: None }
    }

    /// A click on a link.
    #[inline]
    #[must_use]
    pub fn on_link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            anchor: Some(Anchor::new(href, text)),
        }
    }
}

// ============================================================================
// EngagementState
// ============================================================================

/// Engagement signals for one page visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementState {
    /// Deepest scroll reached, in percent.
    pub max_scroll_depth: u8,
    /// Clicks anywhere on the page.
    pub clicks: u32,
}

// ============================================================================
// EngagementTracker
// ============================================================================

/// Accumulates [`EngagementState`] between page-visit boundaries.
#[derive(Debug)]
pub struct EngagementTracker {
    /// Accumulated signals.
    state: EngagementState,
    /// Latest sample of the current scroll burst.
    pending_scroll: Option<ScrollSample>,
    /// When the current burst is evaluated.
    debounce_at: Option<Instant>,
    /// Quiet period.
    debounce: Duration,
}

impl Default for EngagementTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_DEBOUNCE)
    }
}

impl EngagementTracker {
    /// Creates a tracker with the given scroll debounce.
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            state: EngagementState {
                max_scroll_depth: 0,
                clicks: 0,
            },
            pending_scroll: None,
            debounce_at: None,
            debounce,
        }
    }

    /// Current signals, without resetting them.
    #[inline]
    #[must_use]
    pub const fn snapshot(&self) -> EngagementState {
        self.state
    }

    /// Deadline of the pending scroll evaluation.
    #[inline]
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.debounce_at
    }

    /// Records a scroll event, restarting the quiet period.
    pub fn on_scroll(&mut self, sample: ScrollSample, now: Instant) {
        self.pending_scroll = Some(sample);
        self.debounce_at = Some(now + self.debounce);
    }

    /// Evaluates the pending scroll burst if its quiet period has passed.
    ///
    /// Returns `true` if a sample was evaluated.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debounce_at {
            Some(at) if at <= now => {
                self.debounce_at = None;
                if let Some(sample) = self.pending_scroll.take() {
                    self.apply_scroll(sample);
                }
                true
            }
            _ => false,
        }
    }

    /// Folds a scroll sample into the maximum depth.
    pub fn apply_scroll(&mut self, sample: ScrollSample) {
        let percent = sample.percent();
        if percent > self.state.max_scroll_depth {
            trace!(percent, "Scroll depth increased");
            self.state.max_scroll_depth = percent;
        }
    }

    /// Counts one click.
    #[inline]
    pub fn record_click(&mut self) {
        self.state.clicks = self.state.clicks.saturating_add(1);
    }

    /// Starts measuring a new page.
    ///
    /// A scroll burst still pending from the previous page is discarded.
    pub fn reset(&mut self) {
        self.state = EngagementState::default();
        self.pending_scroll = None;
        self.debounce_at = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
