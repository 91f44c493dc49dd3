//! Transport links and the WebSocket connector.
//!
//! A [`Link`] is the beacon's view of one open connection: a queue of
//! outbound text frames and a stream of [`LinkEvent`]s. Connectors produce
//! links; the [`ConnectionManager`](super::ConnectionManager) owns the
//! current one.
//!
//! # Event Loop
//!
//! [`WebSocketConnector`] spawns one pump task per connection that handles:
//!
//! - Incoming text frames from the collector
//! - Outgoing frames queued by the beacon
//! - Close and error notification
//!
//! Dropping the outbound sender closes the socket.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Result;
use crate::identifiers::ConnectionId;

use super::manager::{TransportEvent, TransportEventKind};

// ============================================================================
// Types
// ============================================================================

/// Socket type produced by [`connect_async`].
type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// LinkEvent
// ============================================================================

/// Something that happened on an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A text frame arrived.
    Frame(String),
    /// The transport reported an error.
    Error(String),
    /// The link closed.
    Closed,
}

// ============================================================================
// Link
// ============================================================================

/// Beacon side of an open connection.
#[derive(Debug)]
pub struct Link {
    /// Outbound text frames.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Events from the remote side.
    pub events: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Remote side of an in-memory link.
///
/// Custom connectors hand the [`Link`] to the beacon and keep the peer to
/// bridge frames to their own transport.
#[derive(Debug)]
pub struct LinkPeer {
    /// Frames the beacon sent.
    pub outbound: mpsc::UnboundedReceiver<String>,
    /// Events delivered to the beacon.
    pub events: mpsc::UnboundedSender<LinkEvent>,
}

impl Link {
    /// Creates a connected in-memory link and its peer.
    #[must_use]
    pub fn pair() -> (Self, LinkPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: outbound_tx,
                events: events_rx,
            },
            LinkPeer {
                outbound: outbound_rx,
                events: events_tx,
            },
        )
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Opens transport links to the telemetry endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a link to `endpoint`.
    ///
    /// Resolves once the transport is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be established.
    async fn connect(&self, endpoint: &Url) -> Result<Link>;
}

// ============================================================================
// WebSocketConnector
// ============================================================================

/// [`Connector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Creates a WebSocket connector.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Pump that moves frames between the socket and the link channels.
    async fn run_pump(
        ws_stream: ClientStream,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
        events_tx: mpsc::UnboundedSender<LinkEvent>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the collector
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if events_tx.send(LinkEvent::Frame(text.as_str().to_owned())).is_err() {
                                break;
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            let _ = events_tx.send(LinkEvent::Error(e.to_string()));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Frames queued by the beacon
                frame = outbound_rx.recv() => {
                    match frame {
                        Some(text) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                warn!(error = %e, "Failed to send frame");
                                let _ = events_tx.send(LinkEvent::Error(e.to_string()));
                                break;
                            }
                        }

                        None => {
                            debug!("Outbound queue dropped, closing socket");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        let _ = events_tx.send(LinkEvent::Closed);
        trace!("Pump terminated");
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Url) -> Result<Link> {
        let (ws_stream, _response) = connect_async(endpoint.as_str()).await?;

        info!(endpoint = %endpoint, "WebSocket connection established");

        let (link, peer) = Link::pair();
        tokio::spawn(Self::run_pump(ws_stream, peer.outbound, peer.events));

        Ok(link)
    }
}

// ============================================================================
// Attempts
// ============================================================================

/// Runs one connection attempt in the background.
///
/// Every outcome is reported to `events_tx` tagged with `id`: `Opened` with
/// the outbound queue, then each frame, then `Closed`. A failed attempt
/// reports `Error` only.
pub(crate) fn spawn_attempt(
    connector: Arc<dyn Connector>,
    endpoint: Url,
    id: ConnectionId,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    tokio::spawn(async move {
        let mut link = match connector.connect(&endpoint).await {
            Ok(link) => link,
            Err(e) => {
                warn!(
                    connection_id = %id,
                    endpoint = %endpoint,
                    error = %e,
                    "Telemetry connection failed"
                );
                let _ = events_tx.send(TransportEvent::new(
                    id,
                    TransportEventKind::Error(e.to_string()),
                ));
                return;
            }
        };

        if events_tx
            .send(TransportEvent::new(id, TransportEventKind::Opened(link.outbound)))
            .is_err()
        {
            return;
        }

        while let Some(event) = link.events.recv().await {
            let kind = match event {
                LinkEvent::Frame(text) => TransportEventKind::Frame(text),
                LinkEvent::Error(message) => TransportEventKind::Error(message),
                LinkEvent::Closed => break,
            };
            if events_tx.send(TransportEvent::new(id, kind)).is_err() {
                return;
            }
        }

        let _ = events_tx.send(TransportEvent::new(id, TransportEventKind::Closed));
    });
}

// ============================================================================
// Tests
// ============================================================================
