//! Handle to an installed beacon.
//!
//! The host page forwards its lifecycle and interaction events through a
//! [`BeaconHandle`]. Every method is fire-and-forget: signals sent to a
//! stopped or disabled beacon are dropped silently.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::error::{Error, Result};
use crate::tracking::{Click, ScrollSample};
use crate::transport::ConnectionState;

// ============================================================================
// HostSignal
// ============================================================================

/// Event reported by the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum HostSignal {
    /// The document finished loading.
    DocumentReady,
    /// A client-side navigation happened.
    Navigated,
    /// The page is about to unload.
    BeforeUnload,
    /// The document became hidden.
    VisibilityHidden,
    /// The document scrolled.
    Scrolled(ScrollSample),
    /// Something was clicked.
    Clicked(Click),
    /// Stop the beacon.
    Shutdown,
}

// ============================================================================
// BeaconHandle
// ============================================================================

/// Host-side handle of an installed beacon.
///
/// Dropping the handle stops the beacon runtime.
#[derive(Debug)]
pub struct BeaconHandle {
    /// Signal queue, `None` when telemetry is disabled.
    signals: Option<mpsc::UnboundedSender<HostSignal>>,
    /// Published connection state.
    state: watch::Receiver<ConnectionState>,
    /// Runtime task.
    task: Option<JoinHandle<()>>,
}

impl BeaconHandle {
    /// Handle of a running beacon.
    pub(crate) fn active(
        signals: mpsc::UnboundedSender<HostSignal>,
        state: watch::Receiver<ConnectionState>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            signals: Some(signals),
            state,
            task: Some(task),
        }
    }

    /// Handle of a beacon that was never started.
    pub(crate) fn inactive() -> Self {
        let (_, state) = watch::channel(ConnectionState::Disconnected);
        Self {
            signals: None,
            state,
            task: None,
        }
    }

    /// Returns `true` while the runtime is running.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.signals.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Latest connection state.
    #[inline]
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Waits until the connection reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the beacon stops first.
    pub async fn wait_for_state(&self, state: ConnectionState) -> Result<()> {
        let mut rx = self.state.clone();
        rx.wait_for(|current| *current == state)
            .await
            .map(|_| ())
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// BeaconHandle - Signals
// ============================================================================

impl BeaconHandle {
    /// Forwards `signal` to the runtime.
    pub fn signal(&self, signal: HostSignal) {
        if let Some(tx) = &self.signals
            && tx.send(signal).is_err()
        {
            trace!("Beacon stopped, signal dropped");
        }
    }

    /// The document finished loading.
    #[inline]
    pub fn document_ready(&self) {
        self.signal(HostSignal::DocumentReady);
    }

    /// A client-side navigation happened.
    #[inline]
    pub fn navigated(&self) {
        self.signal(HostSignal::Navigated);
    }

    /// The page is about to unload.
    #[inline]
    pub fn before_unload(&self) {
        self.signal(HostSignal::BeforeUnload);
    }

    /// The document became hidden.
    #[inline]
    pub fn visibility_hidden(&self) {
        self.signal(HostSignal::VisibilityHidden);
    }

    /// The document scrolled.
    #[inline]
    pub fn scrolled(&self, sample: ScrollSample) {
        self.signal(HostSignal::Scrolled(sample));
    }

    /// Something was clicked.
    #[inline]
    pub fn clicked(&self, click: Click) {
        self.signal(HostSignal::Clicked(click));
    }

    /// Stops the beacon and waits for its runtime to finish.
    ///
    /// The open connection, if any, is closed.
    pub async fn shutdown(mut self) {
        self.signal(HostSignal::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_handle_ignores_signals() {
        let handle = BeaconHandle::inactive();
        assert!(!handle.is_active());
        handle.document_ready();
        handle.clicked(Click::plain());
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_inactive_wait_reports_closed() {
        let handle = BeaconHandle::inactive();
        let result = handle.wait_for_state(ConnectionState::Authenticated).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_signals_reach_runtime() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let task = tokio::spawn(async {});
        let handle = BeaconHandle::active(tx, state_rx, task);

        assert!(handle.is_active());
        assert_eq!(handle.connection_state(), ConnectionState::Connecting);

        handle.navigated();
        handle.scrolled(ScrollSample::new(10.0, 100.0, 50.0));
        assert_eq!(rx.recv().await, Some(HostSignal::Navigated));
        assert!(matches!(rx.recv().await, Some(HostSignal::Scrolled(_))));

        drop(rx);
        assert!(!handle.is_active());
    }
}
