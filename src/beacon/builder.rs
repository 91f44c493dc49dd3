//! Builder pattern for beacon configuration.
//!
//! # Example
//!
//! ```no_run
//! use docs_beacon::{Beacon, DeploymentMode};
//!
//! # fn example() -> docs_beacon::Result<()> {
//! let beacon = Beacon::builder()
//!     .endpoint("wss://ws.gpuflow.app/ws/client")
//!     .site("docs")
//!     .mode(DeploymentMode::from_env())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

use super::core::Beacon;
use super::options::{BeaconOptions, DeploymentMode};

// ============================================================================
// Constants
// ============================================================================

/// Collector endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "wss://ws.gpuflow.app/ws/client";

/// Site identifier used when none is configured.
pub const DEFAULT_SITE: &str = "docs";

// ============================================================================
// BeaconBuilder
// ============================================================================

/// Builder for configuring a [`Beacon`].
///
/// Use [`Beacon::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct BeaconBuilder {
    /// Collector endpoint.
    endpoint: Option<String>,
    /// Site identifier.
    site: Option<String>,
    /// Deployment mode.
    mode: DeploymentMode,
    /// Timers and limits.
    options: BeaconOptions,
}

// ============================================================================
// BeaconBuilder Implementation
// ============================================================================

impl BeaconBuilder {
    /// Creates a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collector endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the site identifier reported with every message.
    #[inline]
    #[must_use]
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    /// Sets the deployment mode.
    #[inline]
    #[must_use]
    pub fn mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for production mode.
    #[inline]
    #[must_use]
    pub fn production(self) -> Self {
        self.mode(DeploymentMode::Production)
    }

    /// Sets timers and limits.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: BeaconOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the beacon with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`] if the endpoint is not a ws/wss URL
    /// - [`Error::Config`] if the site is blank or a timer is zero
    pub fn build(self) -> Result<Beacon> {
        let endpoint = self.validate_endpoint()?;
        let site = self.validate_site()?;

        if let Some(name) = self.options.zero_timer() {
            return Err(Error::config(format!("{name} must be greater than zero")));
        }

        Ok(Beacon::new(endpoint, site, self.mode, self.options))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl BeaconBuilder {
    /// Validates the endpoint.
    fn validate_endpoint(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);

        let url = Url::parse(raw).map_err(|e| Error::invalid_endpoint(raw, e.to_string()))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::invalid_endpoint(
                    raw,
                    format!("scheme must be ws or wss, got {other}"),
                ));
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_endpoint(raw, "missing host"));
        }

        Ok(url)
    }

    /// Validates the site identifier.
    fn validate_site(&self) -> Result<String> {
        let site = self.site.as_deref().unwrap_or(DEFAULT_SITE).trim();
        if site.is_empty() {
            return Err(Error::config(
                "Site identifier must not be empty. Use .site() to set it.\n\
                 Example: Beacon::builder().site(\"docs\")",
            ));
        }
        Ok(site.to_owned())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio_test::assert_ok;

    #[test]
    fn test_defaults() {
        let beacon = assert_ok!(BeaconBuilder::new().build());
        assert_eq!(beacon.endpoint().as_str(), DEFAULT_ENDPOINT);
        assert_eq!(beacon.site(), DEFAULT_SITE);
        assert_eq!(beacon.mode(), DeploymentMode::Development);
    }

    #[test]
    fn test_custom_values() {
        let beacon = assert_ok!(
            BeaconBuilder::new()
                .endpoint("ws://127.0.0.1:8080/ws")
                .site("  blog ")
                .production()
                .build()
        );
        assert_eq!(beacon.endpoint().as_str(), "ws://127.0.0.1:8080/ws");
        assert_eq!(beacon.site(), "blog");
        assert!(beacon.mode().is_production());
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = BeaconBuilder::new()
            .endpoint("https://ws.gpuflow.app/ws/client")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
        assert!(err.to_string().contains("scheme"));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let err = BeaconBuilder::new().endpoint("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_rejects_blank_site() {
        let err = BeaconBuilder::new().site("   ").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_zero_timer() {
        let err = BeaconBuilder::new()
            .options(BeaconOptions::new().with_heartbeat_interval(Duration::ZERO))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval"));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = BeaconBuilder::new().site("docs");
        let cloned = builder.clone();
        assert_eq!(builder.site, cloned.site);
    }
}
