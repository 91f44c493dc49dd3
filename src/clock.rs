//! Wall-clock anchoring for virtual time.
//!
//! Durations are measured with [`tokio::time::Instant`]. Wall timestamps are
//! derived from the instant at which the clock was anchored, so pausing and
//! advancing tokio time moves both consistently.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tokio::time::Instant;

// ============================================================================
// Clock
// ============================================================================

/// Maps monotonic instants to wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    /// Monotonic anchor.
    origin: Instant,
    /// Wall time at the anchor.
    origin_wall: DateTime<Utc>,
}

impl Clock {
    /// Anchors a clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self::anchored(Instant::now(), Utc::now())
    }

    /// Anchors a clock at an explicit instant and wall time.
    #[inline]
    #[must_use]
    pub const fn anchored(origin: Instant, origin_wall: DateTime<Utc>) -> Self {
        Self {
            origin,
            origin_wall,
        }
    }

    /// Returns the wall time at `at`.
    #[must_use]
    pub fn wall(&self, at: Instant) -> DateTime<Utc> {
        let elapsed = at.saturating_duration_since(self.origin);
        let delta = TimeDelta::from_std(elapsed).unwrap_or_default();
        self.origin_wall
            .checked_add_signed(delta)
            .unwrap_or(self.origin_wall)
    }

    /// Returns milliseconds since the Unix epoch at `at`.
    #[inline]
    #[must_use]
    pub fn epoch_millis(&self, at: Instant) -> i64 {
        self.wall(at).timestamp_millis()
    }

    /// Returns an ISO-8601 timestamp with millisecond precision at `at`.
    #[inline]
    #[must_use]
    pub fn iso(&self, at: Instant) -> String {
        self.wall(at).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Whole milliseconds between two instants, zero if `later` is earlier.
#[inline]
#[must_use]
pub fn millis_between(earlier: Instant, later: Instant) -> u64 {
    u64::try_from(later.saturating_duration_since(earlier).as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
