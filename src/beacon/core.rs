//! Beacon entry point and runtime.
//!
//! [`Beacon`] holds validated configuration. [`Beacon::install`] starts one
//! runtime task per page that owns every component and drives them from a
//! single `select!` loop over three sources:
//!
//! | Source | Handled by |
//! |--------|------------|
//! | Host signals | navigation, engagement, page leave, connect |
//! | Transport events | connection manager, handshake |
//! | Earliest deadline | reconnect, scroll debounce, path poll, heartbeat |
//!
//! Nothing is shared between tasks except channels, so components are
//! plain state machines that take `now` as an argument.
//!
//! # Example
//!
//! ```no_run
//! use docs_beacon::{Beacon, PageState};
//!
//! # async fn example() -> docs_beacon::Result<()> {
//! let page = PageState::new("https://docs.gpuflow.app/guides/")?;
//! let beacon = Beacon::builder().production().build()?;
//!
//! let handle = beacon.install(page.clone())?;
//! handle.document_ready();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace};
use url::Url;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::session::{Handshake, HandshakeOutcome, PageVisitContext, SessionContext};
use crate::tracking::{
    Click, EngagementTracker, EventEmitter, Heartbeat, NavigationTrigger, NavigationWatcher,
};
use crate::transport::{
    ConnectionManager, ConnectionState, Connector, TransportEvent, TransportOutcome,
    WebSocketConnector, spawn_attempt,
};

use super::builder::BeaconBuilder;
use super::handle::{BeaconHandle, HostSignal};
use super::options::{BeaconOptions, DeploymentMode};

// ============================================================================
// Beacon
// ============================================================================

/// Configured telemetry beacon.
///
/// Create one with [`Beacon::builder()`], then [`install`](Self::install) it
/// into a page.
#[derive(Clone)]
pub struct Beacon {
    /// Collector endpoint.
    endpoint: Url,
    /// Site identifier.
    site: String,
    /// Deployment mode.
    mode: DeploymentMode,
    /// Timers and limits.
    options: BeaconOptions,
}

impl fmt::Debug for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Beacon")
            .field("endpoint", &self.endpoint.as_str())
            .field("site", &self.site)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Beacon - Public API
// ============================================================================

impl Beacon {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> BeaconBuilder {
        BeaconBuilder::new()
    }

    /// Creates a beacon from validated parts.
    pub(crate) fn new(
        endpoint: Url,
        site: String,
        mode: DeploymentMode,
        options: BeaconOptions,
    ) -> Self {
        Self {
            endpoint,
            site,
            mode,
            options,
        }
    }

    /// Collector endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Site identifier.
    #[inline]
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Deployment mode.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Timers and limits.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &BeaconOptions {
        &self.options
    }

    /// Installs the beacon into `host` over WebSocket.
    ///
    /// Outside production this returns an inactive handle and opens nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if called outside a Tokio runtime.
    pub fn install(&self, host: impl Host) -> Result<BeaconHandle> {
        self.install_with(host, WebSocketConnector::new())
    }

    /// Installs the beacon into `host` using a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if called outside a Tokio runtime.
    pub fn install_with(
        &self,
        host: impl Host,
        connector: impl Connector,
    ) -> Result<BeaconHandle> {
        if !self.mode.is_production() {
            info!(mode = %self.mode, "Telemetry disabled outside production");
            return Ok(BeaconHandle::inactive());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::config(format!("Beacon must be installed in a Tokio runtime: {e}"))
        })?;

        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let beacon = BeaconRuntime::new(
            self,
            Arc::new(host),
            Arc::new(connector),
            transport_tx,
            state_tx,
        );
        let task = runtime.spawn(beacon.run(signals_rx, transport_rx));

        info!(endpoint = %self.endpoint, site = %self.site, "Beacon installed");
        Ok(BeaconHandle::active(signals_tx, state_rx, task))
    }
}

// ============================================================================
// BeaconRuntime
// ============================================================================

/// Single owner of all beacon state for one page.
struct BeaconRuntime {
    /// Page the beacon is installed in.
    host: Arc<dyn Host>,
    /// Transport factory.
    connector: Arc<dyn Connector>,
    /// Collector endpoint.
    endpoint: Url,
    /// Connection lifecycle.
    manager: ConnectionManager,
    /// Authentication of the current connection.
    handshake: Handshake,
    /// Visitor facts and token.
    session: SessionContext,
    /// Scroll and clicks of the current page.
    engagement: EngagementTracker,
    /// Current page and transition detection.
    navigation: NavigationWatcher,
    /// Message assembly.
    emitter: EventEmitter,
    /// Periodic `session_update`.
    heartbeat: Heartbeat,
    /// Sender handed to connection attempts.
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    /// Published connection state.
    state_tx: watch::Sender<ConnectionState>,
}

impl BeaconRuntime {
    /// Captures the session and the initial page.
    fn new(
        beacon: &Beacon,
        host: Arc<dyn Host>,
        connector: Arc<dyn Connector>,
        transport_tx: mpsc::UnboundedSender<TransportEvent>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        let now = Instant::now();
        let options = &beacon.options;

        let session = SessionContext::capture(host.as_ref(), now);
        let page = PageVisitContext::capture(host.as_ref(), now);

        Self {
            navigation: NavigationWatcher::new(page, options.poll_interval, options.settle_delay)
                .with_dedupe_window(options.dedupe_window),
            engagement: EngagementTracker::new(options.scroll_debounce),
            emitter: EventEmitter::new(
                beacon.site.clone(),
                Clock::start(),
                options.link_text_limit,
            ),
            heartbeat: Heartbeat::new(options.heartbeat_interval),
            manager: ConnectionManager::new(options.reconnect_delay),
            handshake: Handshake::new(),
            endpoint: beacon.endpoint.clone(),
            session,
            host,
            connector,
            transport_tx,
            state_tx,
        }
    }

    /// Main loop. Returns on shutdown or when the handle is dropped.
    async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<HostSignal>,
        mut transport: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        self.connect();
        self.publish_state();

        loop {
            let deadline = self.next_deadline();

            tokio::select! {
                biased;

                signal = signals.recv() => match signal {
                    Some(HostSignal::Shutdown) | None => break,
                    Some(signal) => self.on_signal(signal),
                },

                Some(event) = transport.recv() => self.on_transport(event),

                () = sleep_until(deadline) => self.on_timers(),
            }

            self.publish_state();
        }

        debug!("Beacon runtime stopped");
    }

    /// Earliest pending component deadline.
    fn next_deadline(&self) -> Instant {
        [
            self.manager.reconnect_deadline(),
            self.engagement.deadline(),
            self.heartbeat.deadline(),
        ]
        .into_iter()
        .flatten()
        .fold(self.navigation.deadline(), Instant::min)
    }

    /// Publishes the connection state if it changed.
    fn publish_state(&self) {
        let state = self.manager.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    /// Starts a connection attempt unless one is already underway.
    fn connect(&mut self) {
        if let Some(id) = self.manager.ensure_connected() {
            spawn_attempt(
                Arc::clone(&self.connector),
                self.endpoint.clone(),
                id,
                self.transport_tx.clone(),
            );
        }
    }
}

// ============================================================================
// BeaconRuntime - Host Signals
// ============================================================================

impl BeaconRuntime {
    fn on_signal(&mut self, signal: HostSignal) {
        let now = Instant::now();
        trace!(?signal, "Host signal");

        match signal {
            HostSignal::DocumentReady => self.connect(),
            HostSignal::Navigated => self.navigation.on_navigated(now),
            HostSignal::BeforeUnload | HostSignal::VisibilityHidden => self.leave_page(now),
            HostSignal::Scrolled(sample) => self.engagement.on_scroll(sample, now),
            HostSignal::Clicked(click) => self.on_click(click),
            HostSignal::Shutdown => {}
        }
    }

    fn on_click(&mut self, click: Click) {
        self.engagement.record_click();

        if let Some(anchor) = click.anchor {
            let message = self.emitter.link_click(&anchor, &self.host.location());
            self.emitter.emit(&mut self.manager, message, Instant::now());
        }
    }
}

// ============================================================================
// BeaconRuntime - Transport
// ============================================================================

impl BeaconRuntime {
    fn on_transport(&mut self, event: TransportEvent) {
        let now = Instant::now();

        match self.manager.on_event(event, now) {
            TransportOutcome::Opened => {
                self.handshake.begin(
                    &mut self.session,
                    &mut self.manager,
                    self.emitter.clock(),
                    now,
                );
            }

            TransportOutcome::Frame(text) => {
                if self.handshake.on_frame(&text, &mut self.manager)
                    == HandshakeOutcome::Authenticated
                {
                    self.on_authenticated(now);
                }
            }

            TransportOutcome::Disconnected => self.handshake.reset(),

            TransportOutcome::Ignored => {}
        }
    }

    /// Announces the session and the current page on a fresh connection.
    fn on_authenticated(&mut self, now: Instant) {
        let message = self.emitter.session_start(&self.session);
        self.emitter.emit(&mut self.manager, message, now);

        // The page being measured is announced as is. Its start time and
        // engagement survive reconnects.
        let message = self
            .emitter
            .page_visit(self.navigation.page(), &self.session);
        self.emitter.emit(&mut self.manager, message, now);

        if self.heartbeat.start(now) {
            debug!("Heartbeat started");
        }
    }
}

// ============================================================================
// BeaconRuntime - Timers
// ============================================================================

impl BeaconRuntime {
    fn on_timers(&mut self) {
        let now = Instant::now();

        if self.manager.reconnect_due(now) {
            self.connect();
        }

        self.engagement.poll(now);

        while let Some(trigger) = self.navigation.due(self.host.as_ref(), now) {
            self.transition(trigger, now);
        }

        if self.heartbeat.due(now) {
            if self.manager.is_authenticated() {
                let message = self.emitter.session_update(
                    self.navigation.page(),
                    &self.engagement,
                    &self.session,
                    now,
                );
                self.emitter.emit(&mut self.manager, message, now);
            } else {
                trace!("Heartbeat skipped while unauthenticated");
            }
        }
    }
}

// ============================================================================
// BeaconRuntime - Pages
// ============================================================================

impl BeaconRuntime {
    /// Leaves the current page and enters the one the host shows now.
    fn transition(&mut self, trigger: NavigationTrigger, now: Instant) {
        debug!(?trigger, from = %self.navigation.current_path(), "Navigation detected");
        self.leave_page(now);
        self.begin_page(now);
    }

    /// Reports engagement on the current page.
    fn leave_page(&mut self, now: Instant) {
        let message = self
            .emitter
            .page_leave(self.navigation.page(), &self.engagement, now);
        self.emitter.emit(&mut self.manager, message, now);
    }

    /// Starts measuring the page the host shows now.
    fn begin_page(&mut self, now: Instant) {
        let page = PageVisitContext::capture(self.host.as_ref(), now);
        self.engagement.reset();
        let message = self.emitter.page_visit(&page, &self.session);
        self.navigation.begin_page(page);
        self.emitter.emit(&mut self.manager, message, now);
    }
}

// ============================================================================
// Tests
// ============================================================================
