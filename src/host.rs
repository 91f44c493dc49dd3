//! Host page collaborator.
//!
//! The beacon never renders anything. It only reads a handful of facts about
//! the page it is installed in: where the page is, what it is called, and a
//! few properties of the browsing environment. Those reads go through the
//! [`Host`] trait so the beacon works the same against a real page bridge or
//! an in-memory [`PageState`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use url::Url;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Section label used when the path has no segments.
pub const DEFAULT_SECTION: &str = "home";

// ============================================================================
// Host Trait
// ============================================================================

/// Read access to the page the beacon is installed in.
pub trait Host: Send + Sync + 'static {
    /// Current location of the page.
    fn location(&self) -> Location;

    /// Current document title.
    fn title(&self) -> String;

    /// Document referrer, empty when there is none.
    fn referrer(&self) -> String;

    /// Browser user agent string.
    fn user_agent(&self) -> String;

    /// Viewport dimensions in CSS pixels.
    fn viewport(&self) -> Viewport;

    /// IANA timezone name of the visitor.
    fn timezone(&self) -> String;

    /// Preferred locale of the visitor.
    fn locale(&self) -> String;
}

// ============================================================================
// Viewport
// ============================================================================

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// Location
// ============================================================================

/// Absolute location of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parses an absolute page URL.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Url`] if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    /// Host name, empty for host-less URLs.
    #[inline]
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Path component, always starting with `/` for web URLs.
    #[inline]
    #[must_use]
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query string including the leading `?`, or empty.
    #[must_use]
    pub fn search(&self) -> String {
        match self.url.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        }
    }

    /// Path followed by the query string.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.pathname(), self.search())
    }

    /// First path segment, or [`DEFAULT_SECTION`] for the site root.
    #[must_use]
    pub fn section(&self) -> &str {
        self.pathname()
            .split('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_SECTION)
    }

    /// Returns `true` if `href`, resolved against this page, points at
    /// another host.
    ///
    /// Unresolvable and host-less targets (`mailto:`, `javascript:`) count
    /// as internal.
    #[must_use]
    pub fn is_external(&self, href: &str) -> bool {
        match self.url.join(href) {
            Ok(target) => target
                .host_str()
                .is_some_and(|host| !host.eq_ignore_ascii_case(self.hostname())),
            Err(_) => false,
        }
    }
}

// ============================================================================
// PageState
// ============================================================================

/// Snapshot of everything a [`Host`] reports.
#[derive(Debug, Clone)]
struct PageSnapshot {
    location: Location,
    title: String,
    referrer: String,
    user_agent: String,
    viewport: Viewport,
    timezone: String,
    locale: String,
}

/// In-memory, shareable [`Host`].
///
/// Cloning shares the same underlying page, so an embedder can keep one clone
/// to drive navigation while the beacon reads from another.
#[derive(Debug, Clone)]
pub struct PageState {
    inner: Arc<RwLock<PageSnapshot>>,
}

impl PageState {
    /// Creates a page at `href` with empty metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Url`] if `href` is not an absolute URL.
    pub fn new(href: &str) -> Result<Self> {
        let snapshot = PageSnapshot {
            location: Location::parse(href)?,
            title: String::new(),
            referrer: String::new(),
            user_agent: String::new(),
            viewport: Viewport::default(),
            timezone: "UTC".to_string(),
            locale: "en-US".to_string(),
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(snapshot)),
        })
    }

    /// Moves the page to `href` without a reload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Url`] if `href` cannot be resolved.
    pub fn navigate(&self, href: &str) -> Result<()> {
        let mut page = self.inner.write();
        let target = page.location.url.join(href)?;
        page.location = Location { url: target };
        Ok(())
    }

    /// Sets the document title.
    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.write().title = title.into();
    }

    /// Sets the document referrer.
    pub fn set_referrer(&self, referrer: impl Into<String>) {
        self.inner.write().referrer = referrer.into();
    }

    /// Sets the user agent.
    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        self.inner.write().user_agent = user_agent.into();
    }

    /// Sets the viewport size.
    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.write().viewport = viewport;
    }

    /// Sets timezone and locale.
    pub fn set_region(&self, timezone: impl Into<String>, locale: impl Into<String>) {
        let mut page = self.inner.write();
        page.timezone = timezone.into();
        page.locale = locale.into();
    }
}

impl Host for PageState {
    fn location(&self) -> Location {
        self.inner.read().location.clone()
    }

    fn title(&self) -> String {
        self.inner.read().title.clone()
    }

    fn referrer(&self) -> String {
        self.inner.read().referrer.clone()
    }

    fn user_agent(&self) -> String {
        self.inner.read().user_agent.clone()
    }

    fn viewport(&self) -> Viewport {
        self.inner.read().viewport
    }

    fn timezone(&self) -> String {
        self.inner.read().timezone.clone()
    }

    fn locale(&self) -> String {
        self.inner.read().locale.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parts() {
        let location = Location::parse("https://docs.gpuflow.app/guides/setup?tab=linux").unwrap();
        assert_eq!(location.hostname(), "docs.gpuflow.app");
        assert_eq!(location.pathname(), "/guides/setup");
        assert_eq!(location.search(), "?tab=linux");
        assert_eq!(location.path_and_query(), "/guides/setup?tab=linux");
    }

    #[test]
    fn test_empty_query_has_no_marker() {
        let location = Location::parse("https://docs.gpuflow.app/a?").unwrap();
        assert_eq!(location.path_and_query(), "/a");
    }

    #[test]
    fn test_section() {
        let nested = Location::parse("https://docs.gpuflow.app/providers/pricing/").unwrap();
        let root = Location::parse("https://docs.gpuflow.app/").unwrap();
        assert_eq!(nested.section(), "providers");
        assert_eq!(root.section(), DEFAULT_SECTION);
    }

    #[test]
    fn test_is_external() {
        let location = Location::parse("https://docs.gpuflow.app/guides/").unwrap();
        assert!(location.is_external("https://other.example/x"));
        assert!(!location.is_external("https://docs.gpuflow.app/reference/"));
        assert!(!location.is_external("/renters/"));
        assert!(!location.is_external("../developers/api"));
        assert!(!location.is_external("#install"));
        assert!(!location.is_external("mailto:team@gpuflow.app"));
    }

    #[test]
    fn test_page_state_navigate_relative() {
        let page = PageState::new("https://docs.gpuflow.app/a").unwrap();
        page.navigate("/b?x=1").unwrap();
        assert_eq!(page.location().path_and_query(), "/b?x=1");
        assert_eq!(page.location().hostname(), "docs.gpuflow.app");
    }

    #[test]
    fn test_page_state_clones_share_state() {
        let page = PageState::new("https://docs.gpuflow.app/").unwrap();
        let reader = page.clone();
        page.set_title("Guides");
        page.set_viewport(Viewport::new(1280, 720));
        assert_eq!(reader.title(), "Guides");
        assert_eq!(reader.viewport(), Viewport::new(1280, 720));
    }
}
