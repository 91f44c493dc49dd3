//! Session and page-visit context.

use tokio::time::Instant;

use crate::clock::millis_between;
use crate::host::{Host, Viewport};
use crate::identifiers::AnonymousToken;

// ============================================================================
// SessionContext
// ============================================================================

/// Facts about the visitor captured once per page-load lifetime.
///
/// Only the token changes afterwards: it is regenerated for every
/// connection attempt.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// When the beacon was installed.
    pub started_at: Instant,
    /// Token of the current connection, if one was opened.
    pub token: Option<AnonymousToken>,
    /// Browser user agent.
    pub user_agent: String,
    /// Viewport at install time.
    pub viewport: Viewport,
    /// Visitor timezone.
    pub timezone: String,
    /// Visitor locale.
    pub locale: String,
}

impl SessionContext {
    /// Captures the session from `host`.
    #[must_use]
    pub fn capture(host: &dyn Host, now: Instant) -> Self {
        Self {
            started_at: now,
            token: None,
            user_agent: host.user_agent(),
            viewport: host.viewport(),
            timezone: host.timezone(),
            locale: host.locale(),
        }
    }

    /// Replaces the token with a fresh one.
    pub fn regenerate_token(&mut self, epoch_millis: i64) -> &AnonymousToken {
        self.token.insert(AnonymousToken::generate(epoch_millis))
    }

    /// Milliseconds since the session started.
    #[inline]
    #[must_use]
    pub fn duration_ms(&self, now: Instant) -> u64 {
        millis_between(self.started_at, now)
    }
}

// ============================================================================
// PageVisitContext
// ============================================================================

/// The page currently being measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVisitContext {
    /// Path and query.
    pub url: String,
    /// Path only.
    pub path: String,
    /// Document title.
    pub title: String,
    /// Document referrer.
    pub referrer: String,
    /// Viewport when the visit began.
    pub viewport: Viewport,
    /// When the visit began.
    pub started_at: Instant,
}

impl PageVisitContext {
    /// Captures the page `host` is currently showing.
    #[must_use]
    pub fn capture(host: &dyn Host, now: Instant) -> Self {
        let location = host.location();
        Self {
            url: location.path_and_query(),
            path: location.pathname().to_owned(),
            title: host.title(),
            referrer: host.referrer(),
            viewport: host.viewport(),
            started_at: now,
        }
    }

    /// Milliseconds spent on the page.
    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        millis_between(self.started_at, now)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::host::PageState;

    fn page() -> PageState {
        let page = PageState::new("https://docs.gpuflow.app/guides/?q=gpu").unwrap();
        page.set_title("Guides");
        page.set_referrer("https://search.example/");
        page.set_user_agent("Mozilla/5.0");
        page.set_viewport(Viewport::new(1440, 900));
        page.set_region("Europe/Berlin", "de-DE");
        page
    }

    #[test]
    fn test_session_capture() {
        let now = Instant::now();
        let session = SessionContext::capture(&page(), now);
        assert_eq!(session.user_agent, "Mozilla/5.0");
        assert_eq!(session.viewport, Viewport::new(1440, 900));
        assert_eq!(session.timezone, "Europe/Berlin");
        assert_eq!(session.locale, "de-DE");
        assert!(session.token.is_none());
        assert_eq!(session.duration_ms(now + Duration::from_millis(900)), 900);
    }

    #[test]
    fn test_token_regenerated_per_call() {
        let mut session = SessionContext::capture(&page(), Instant::now());
        let first = session.regenerate_token(10).clone();
        let second = session.regenerate_token(20).clone();
        assert_ne!(first, second);
        assert_eq!(session.token.as_ref(), Some(&second));
    }

    #[test]
    fn test_page_capture() {
        let now = Instant::now();
        let visit = PageVisitContext::capture(&page(), now);
        assert_eq!(visit.url, "/guides/?q=gpu");
        assert_eq!(visit.path, "/guides/");
        assert_eq!(visit.title, "Guides");
        assert_eq!(visit.referrer, "https://search.example/");
        assert_eq!(visit.viewport, Viewport::new(1440, 900));
        assert_eq!(visit.elapsed_ms(now + Duration::from_secs(2)), 2_000);
    }
}
