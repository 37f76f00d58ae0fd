//! Per-connection handler

use std::fmt;

use tokio::net::UnixStream;

use hostlink_core::error::ProxyError;
use hostlink_core::types::HostDescriptor;

use crate::adapter::LocalStream;
use crate::bridge::{BridgeStats, ConnectionPair};
use crate::session::SessionEstablisher;

/// Lifecycle of one accepted connection
///
/// `Accepted → SessionPending → Bridging → Closed`, or straight from
/// `SessionPending` to `Closed` when no session could be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Local connection accepted
    Accepted,
    /// Waiting for the host access session
    SessionPending,
    /// Relaying between local connection and session
    Bridging,
    /// Both sides closed
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Accepted => write!(f, "accepted"),
            ConnectionState::SessionPending => write!(f, "session pending"),
            ConnectionState::Bridging => write!(f, "bridging"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Bridges accepted connections to the resolved host
pub struct ConnectionHandler {
    /// Host resolved at startup
    host: HostDescriptor,
    /// Session negotiation
    establisher: SessionEstablisher,
    /// Maximum local read size
    read_size: usize,
}

impl ConnectionHandler {
    /// Create a handler for `host`
    pub fn new(host: HostDescriptor, establisher: SessionEstablisher, read_size: usize) -> Self {
        Self {
            host,
            establisher,
            read_size,
        }
    }

    /// Handle a connection to completion, logging the outcome
    pub async fn handle(&self, id: u64, stream: UnixStream) {
        match self.try_handle(id, stream).await {
            Ok(stats) if stats.failed => tracing::warn!(
                "Connection {} closed after a stream failure ({} bytes sent, {} bytes received)",
                id,
                stats.sent,
                stats.received
            ),
            Ok(stats) => tracing::info!(
                "Connection {} closed ({} bytes sent, {} bytes received)",
                id,
                stats.sent,
                stats.received
            ),
            Err(e) => tracing::error!("Failed to handle connection {}: {}", id, e),
        }
    }

    /// Open a session and bridge `stream` to it
    ///
    /// `stream` is owned here, so it is closed on every return path.
    pub async fn try_handle(&self, id: u64, stream: UnixStream) -> Result<BridgeStats, ProxyError> {
        tracing::debug!("Connection {}: {}", id, ConnectionState::SessionPending);
        let remote = self.establisher.establish(&self.host).await?;

        tracing::debug!("Connection {}: {}", id, ConnectionState::Bridging);
        let local = LocalStream::with_read_size(stream, self.read_size);
        let stats = ConnectionPair::new(Box::new(local), remote).run().await;

        tracing::debug!("Connection {}: {}", id, ConnectionState::Closed);
        Ok(stats)
    }
}
