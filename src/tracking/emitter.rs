//! Telemetry message assembly and the heartbeat timer.
//!
//! [`EventEmitter`] turns context and engagement into messages and hands
//! them to the [`ConnectionManager`], stamping each with its send time. It
//! never changes connection state.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::clock::Clock;
use crate::host::Location;
use crate::protocol::{
    Envelope, LinkClick, PageLeave, PageVisit, SessionStart, SessionUpdate, TelemetryMessage,
};
use crate::session::{PageVisitContext, SessionContext};
use crate::transport::ConnectionManager;

use super::engagement::{Anchor, EngagementTracker};

// ============================================================================
// Constants
// ============================================================================

/// Interval between `session_update` heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(15_000);

/// Maximum characters of link text reported.
pub const DEFAULT_LINK_TEXT_LIMIT: usize = 50;

// ============================================================================
// EventEmitter
// ============================================================================

/// Builds telemetry messages and dispatches them.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    /// Site identifier included in every payload.
    site: String,
    /// Clock for send timestamps.
    clock: Clock,
    /// Maximum characters of link text.
    link_text_limit: usize,
}

impl EventEmitter {
    /// Creates an emitter for `site`.
    #[must_use]
    pub fn new(site: impl Into<String>, clock: Clock, link_text_limit: usize) -> Self {
        Self {
            site: site.into(),
            clock,
            link_text_limit,
        }
    }

    /// Clock used for timestamps.
    #[inline]
    #[must_use]
    pub const fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Stamps `message` with the current time and hands it to `manager`.
    ///
    /// Returns `true` if it was transmitted.
    pub fn emit(
        &self,
        manager: &mut ConnectionManager,
        message: TelemetryMessage,
        now: Instant,
    ) -> bool {
        let kind = message.kind();
        let sent = manager.send(&Envelope::new(message, self.clock.epoch_millis(now)));
        trace!(kind, sent, "Emitted");
        sent
    }

    /// `session_start` for the current connection.
    #[must_use]
    pub fn session_start(&self, session: &SessionContext) -> TelemetryMessage {
        TelemetryMessage::SessionStart(SessionStart {
            site: self.site.clone(),
            session_start: self.clock.iso(session.started_at),
            user_agent: session.user_agent.clone(),
            viewport: session.viewport,
            timezone: session.timezone.clone(),
            language: session.locale.clone(),
        })
    }

    /// `page_visit` for `page`.
    ///
    /// Engagement is not touched: a page announced again on a new
    /// connection keeps what was measured so far.
    #[must_use]
    pub fn page_visit(&self, page: &PageVisitContext, session: &SessionContext) -> TelemetryMessage {
        TelemetryMessage::PageVisit(PageVisit {
            url: page.url.clone(),
            title: page.title.clone(),
            referrer: page.referrer.clone(),
            site: self.site.clone(),
            user_agent: session.user_agent.clone(),
            viewport: page.viewport,
        })
    }

    /// `page_leave` for the page being left.
    #[must_use]
    pub fn page_leave(
        &self,
        page: &PageVisitContext,
        engagement: &EngagementTracker,
        now: Instant,
    ) -> TelemetryMessage {
        let state = engagement.snapshot();
        TelemetryMessage::PageLeave(PageLeave {
            url: page.path.clone(),
            site: self.site.clone(),
            duration: page.elapsed_ms(now),
            scroll_depth: state.max_scroll_depth,
            clicks: state.clicks,
        })
    }

    /// `session_update` heartbeat.
    #[must_use]
    pub fn session_update(
        &self,
        page: &PageVisitContext,
        engagement: &EngagementTracker,
        session: &SessionContext,
        now: Instant,
    ) -> TelemetryMessage {
        let state = engagement.snapshot();
        TelemetryMessage::SessionUpdate(SessionUpdate {
            site: self.site.clone(),
            page: page.path.clone(),
            time_on_page: page.elapsed_ms(now),
            scroll_depth: state.max_scroll_depth,
            clicks: state.clicks,
            session_duration: session.duration_ms(now),
        })
    }

    /// `docs_link_click` for an anchor clicked on `location`.
    #[must_use]
    pub fn link_click(&self, anchor: &Anchor, location: &Location) -> TelemetryMessage {
        TelemetryMessage::DocsLinkClick(LinkClick {
            href: anchor.href.clone(),
            text: anchor
                .text
                .trim()
                .chars()
                .take(self.link_text_limit)
                .collect(),
            is_external: location.is_external(&anchor.href),
            section: location.section().to_owned(),
            site: self.site.clone(),
        })
    }
}

// ============================================================================
// Heartbeat
// ============================================================================

/// Fixed-interval heartbeat timer.
///
/// Started once; starting it again has no effect, so the tick rate never
/// doubles across reconnects.
#[derive(Debug)]
pub struct Heartbeat {
    /// Tick interval.
    interval: Duration,
    /// Next tick, once started.
    next: Option<Instant>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}

impl Heartbeat {
    /// Creates a stopped heartbeat.
    #[inline]
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    /// Next tick.
    #[inline]
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Starts ticking one interval from `now`.
    ///
    /// Returns `false` if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next.is_some() {
            return false;
        }
        self.next = Some(now + self.interval);
        true
    }

    /// Consumes a tick if one is due.
    ///
    /// Ticks missed while the runtime was busy collapse into one.
    pub fn due(&mut self, now: Instant) -> bool {
        let Some(mut next) = self.next else {
            return false;
        };
        if next > now {
            return false;
        }
        while next <= now {
            next += self.interval;
        }
        self.next = Some(next);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::host::{Host, PageState, Viewport};
    use crate::tracking::engagement::ScrollSample;

    struct Fixture {
        emitter: EventEmitter,
        page: PageState,
        session: SessionContext,
        visit: PageVisitContext,
        now: Instant,
    }

    fn fixture() -> Fixture {
        let now = Instant::now();
        let clock = Clock::anchored(now, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        let page = PageState::new("https://docs.gpuflow.app/guides/setup?os=linux").unwrap();
        page.set_title("Setup");
        page.set_user_agent("Mozilla/5.0");
        page.set_viewport(Viewport::new(1280, 720));

        Fixture {
            emitter: EventEmitter::new("docs", clock, DEFAULT_LINK_TEXT_LIMIT),
            session: SessionContext::capture(&page, now),
            visit: PageVisitContext::capture(&page, now),
            page,
            now,
        }
    }

    fn data(message: TelemetryMessage) -> serde_json::Value {
        let value = serde_json::to_value(Envelope::new(message, 0)).unwrap();
        value["data"].clone()
    }

    #[test]
    fn test_session_start_payload() {
        let fx = fixture();
        let data = data(fx.emitter.session_start(&fx.session));
        assert_eq!(data["site"], "docs");
        assert_eq!(data["sessionStart"], "2025-03-01T12:00:00.000Z");
        assert_eq!(data["viewport"], json!({ "width": 1280, "height": 720 }));
    }

    #[test]
    fn test_page_visit_payload() {
        let fx = fixture();
        let data = data(fx.emitter.page_visit(&fx.visit, &fx.session));
        assert_eq!(data["url"], "/guides/setup?os=linux");
        assert_eq!(data["title"], "Setup");
        assert_eq!(data["userAgent"], "Mozilla/5.0");
    }

    #[test]
    fn test_page_leave_reports_engagement() {
        let fx = fixture();
        let mut engagement = EngagementTracker::default();
        engagement.record_click();
        engagement.apply_scroll(ScrollSample::new(250.0, 2000.0, 1000.0));

        let message =
            fx.emitter
                .page_leave(&fx.visit, &engagement, fx.now + Duration::from_millis(4_200));

        assert_eq!(
            data(message),
            json!({
                "url": "/guides/setup",
                "site": "docs",
                "duration": 4200,
                "scrollDepth": 25,
                "clicks": 1
            })
        );
        // Leaving does not reset.
        assert_eq!(engagement.snapshot().clicks, 1);
    }

    #[test]
    fn test_session_update_payload() {
        let fx = fixture();
        let engagement = EngagementTracker::default();
        let later = fx.now + DEFAULT_HEARTBEAT_INTERVAL;

        let data = data(fx.emitter.session_update(&fx.visit, &engagement, &fx.session, later));
        assert_eq!(data["page"], "/guides/setup");
        assert_eq!(data["timeOnPage"], 15_000);
        assert_eq!(data["sessionDuration"], 15_000);
    }

    #[test]
    fn test_link_click_payload() {
        let fx = fixture();
        let location = fx.page.location();
        let long = "x".repeat(80);

        let external = data(fx.emitter.link_click(
            &Anchor::new("https://other.example/x", format!("  {long}  ")),
            &location,
        ));
        assert_eq!(external["isExternal"], true);
        assert_eq!(external["section"], "guides");
        assert_eq!(external["text"].as_str().unwrap().chars().count(), 50);

        let internal = data(fx.emitter.link_click(&Anchor::new("/renters/", "Renters"), &location));
        assert_eq!(internal["isExternal"], false);
        assert_eq!(internal["text"], "Renters");
    }

    #[test]
    fn test_emit_stamps_send_time() {
        let fx = fixture();
        let mut manager = ConnectionManager::default();
        let id = manager.ensure_connected().unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        manager.on_event(
            crate::transport::TransportEvent::new(
                id,
                crate::transport::TransportEventKind::Opened(tx),
            ),
            fx.now,
        );
        manager.mark_authenticated();

        let later = fx.now + Duration::from_millis(1_234);
        assert!(fx.emitter.emit(&mut manager, fx.emitter.session_start(&fx.session), later));

        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            frame["timestamp"],
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap().timestamp_millis() + 1_234
        );
    }

    #[test]
    fn test_heartbeat_start_is_idempotent() {
        let now = Instant::now();
        let mut heartbeat = Heartbeat::default();
        assert!(!heartbeat.due(now + Duration::from_secs(60)));

        assert!(heartbeat.start(now));
        assert!(!heartbeat.start(now + Duration::from_secs(5)));
        assert_eq!(heartbeat.deadline(), Some(now + DEFAULT_HEARTBEAT_INTERVAL));
    }

    #[test]
    fn test_heartbeat_ticks_on_interval() {
        let now = Instant::now();
        let mut heartbeat = Heartbeat::default();
        heartbeat.start(now);

        assert!(!heartbeat.due(now + Duration::from_millis(14_999)));
        assert!(heartbeat.due(now + DEFAULT_HEARTBEAT_INTERVAL));
        assert!(!heartbeat.due(now + DEFAULT_HEARTBEAT_INTERVAL));
        assert_eq!(heartbeat.deadline(), Some(now + DEFAULT_HEARTBEAT_INTERVAL * 2));

        // A long stall produces a single tick.
        assert!(heartbeat.due(now + Duration::from_secs(100)));
        assert!(!heartbeat.due(now + Duration::from_secs(100)));
    }
}
