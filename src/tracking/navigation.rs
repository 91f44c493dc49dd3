//! Page transition detection.
//!
//! Two producers feed one transition handler:
//!
//! - **Signal**: the host reports a client-side navigation; the transition
//!   is evaluated after a settle delay so title and URL are final.
//! - **Poll**: the current path is compared with the measured page on a
//!   fixed interval, for navigations that never fire the signal.
//!
//! A poll transition requires a path change. A signal transition is dropped
//! when it targets the page that is already current and the previous
//! transition happened within the dedupe window, so a navigation seen by
//! both producers counts once.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::host::Host;
use crate::session::PageVisitContext;

// ============================================================================
// Constants
// ============================================================================

/// Interval of the fallback path poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Delay between a navigation signal and its evaluation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

// ============================================================================
// NavigationTrigger
// ============================================================================

/// Which producer detected a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTrigger {
    /// Host navigation signal, after settling.
    Signal,
    /// Fallback path poll.
    Poll,
}

// ============================================================================
// NavigationWatcher
// ============================================================================

/// Owns the page currently being measured and decides when it changes.
#[derive(Debug)]
pub struct NavigationWatcher {
    /// Current page.
    page: PageVisitContext,
    /// When the current page began.
    last_transition: Instant,
    /// Pending settle deadline of a navigation signal.
    settle_at: Option<Instant>,
    /// Next path poll.
    next_poll: Instant,
    /// Poll period.
    poll_interval: Duration,
    /// Settle delay.
    settle_delay: Duration,
    /// Window in which a same-path signal is a duplicate.
    dedupe_window: Duration,
}

impl NavigationWatcher {
    /// Starts watching from `page`.
    ///
    /// The first poll happens one interval after the page began.
    #[must_use]
    pub fn new(page: PageVisitContext, poll_interval: Duration, settle_delay: Duration) -> Self {
        let started_at = page.started_at;
        Self {
            page,
            last_transition: started_at,
            settle_at: None,
            next_poll: started_at + poll_interval,
            poll_interval,
            settle_delay,
            dedupe_window: settle_delay,
        }
    }

    /// Overrides the dedupe window.
    #[must_use]
    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    /// Page currently being measured.
    #[inline]
    #[must_use]
    pub const fn page(&self) -> &PageVisitContext {
        &self.page
    }

    /// Path of the page currently being measured.
    #[inline]
    #[must_use]
    pub fn current_path(&self) -> &str {
        &self.page.path
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        match self.settle_at {
            Some(settle) => settle.min(self.next_poll),
            None => self.next_poll,
        }
    }

    /// Records a host navigation signal.
    ///
    /// A later signal replaces a pending one.
    pub fn on_navigated(&mut self, now: Instant) {
        self.settle_at = Some(now + self.settle_delay);
        trace!("Navigation signal settling");
    }

    /// Returns a transition whose deadline has passed, if any is admitted.
    ///
    /// Call again after handling a transition; a signal and a poll may fall
    /// due at the same instant.
    pub fn due(&mut self, host: &dyn Host, now: Instant) -> Option<NavigationTrigger> {
        if let Some(at) = self.settle_at
            && at <= now
        {
            self.settle_at = None;
            let location = host.location();
            if self.admit(NavigationTrigger::Signal, location.pathname(), now) {
                return Some(NavigationTrigger::Signal);
            }
            debug!(path = %location.pathname(), "Duplicate navigation signal dropped");
        }

        if self.next_poll <= now {
            while self.next_poll <= now {
                self.next_poll += self.poll_interval;
            }
            let location = host.location();
            if self.admit(NavigationTrigger::Poll, location.pathname(), now) {
                return Some(NavigationTrigger::Poll);
            }
        }

        None
    }

    /// Decides whether a transition to `path` counts.
    #[must_use]
    pub fn admit(&self, trigger: NavigationTrigger, path: &str, now: Instant) -> bool {
        let same_path = path == self.page.path;
        match trigger {
            NavigationTrigger::Poll => !same_path,
            NavigationTrigger::Signal => {
                !(same_path
                    && now.saturating_duration_since(self.last_transition) <= self.dedupe_window)
            }
        }
    }

    /// Makes `page` the page being measured.
    pub fn begin_page(&mut self, page: PageVisitContext) {
        debug!(from = %self.page.path, to = %page.path, "Page transition");
        self.last_transition = page.started_at;
        self.page = page;
    }
}

// ============================================================================
// Tests
// ============================================================================
