//! Bidirectional chunk relay between a local connection and a remote session
//!
//! A [`ConnectionPair`] runs two copy tasks, local→remote and remote→local.
//! Both share a single close signal: whichever task ends first fires it, the
//! other task's pending read or write is abandoned, and each task closes the
//! writer it owns. The pair completes once both tasks have finished.

use std::fmt;
use std::time::Duration;

use hostlink_core::error::StreamError;
use hostlink_core::traits::{ChunkReader, ChunkWriter, DuplexSession};
use tokio_util::sync::CancellationToken;

/// Upper bound for closing a writer after the pair shut down.
///
/// Closing a websocket sends a close frame, which can stall on a peer that
/// stopped reading.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Copy direction within a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Local client to remote session
    LocalToRemote,
    /// Remote session to local client
    RemoteToLocal,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LocalToRemote => write!(f, "local->remote"),
            Direction::RemoteToLocal => write!(f, "remote->local"),
        }
    }
}

/// Byte counts for a finished pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Bytes relayed from the local client to the remote session
    pub sent: u64,
    /// Bytes relayed from the remote session to the local client
    pub received: u64,
    /// A read or write failed, as opposed to a clean end of stream
    pub failed: bool,
}

/// How one copy task ended
struct CopyOutcome {
    relayed: u64,
    failed: bool,
}

/// Shared close signal of a connection pair
///
/// Closing is idempotent and safe from either copy task.
#[derive(Clone, Default)]
pub struct PairCloser {
    token: CancellationToken,
}

impl PairCloser {
    /// Create an open closer
    pub fn new() -> Self {
        Self::default()
    }

    /// Close both streams of the pair
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether the pair has been closed
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the pair is closed
    pub async fn closed(&self) {
        self.token.cancelled().await
    }

    /// Guard that closes the pair when dropped, including on panic
    fn close_on_drop(&self) -> tokio_util::sync::DropGuard {
        self.token.clone().drop_guard()
    }
}

/// A local connection and its remote session, bridged for one lifetime
pub struct ConnectionPair {
    local: DuplexSession,
    remote: DuplexSession,
    closer: PairCloser,
}

impl ConnectionPair {
    /// Pair a local stream with a remote session
    pub fn new(local: DuplexSession, remote: DuplexSession) -> Self {
        Self {
            local,
            remote,
            closer: PairCloser::new(),
        }
    }

    /// Handle to close the pair from outside
    pub fn closer(&self) -> PairCloser {
        self.closer.clone()
    }

    /// Relay until either side ends, then close both
    pub async fn run(self) -> BridgeStats {
        let (local_reader, local_writer) = self.local.into_split();
        let (remote_reader, remote_writer) = self.remote.into_split();

        let upstream = tokio::spawn(copy_loop(
            Direction::LocalToRemote,
            local_reader,
            remote_writer,
            self.closer.clone(),
        ));
        let downstream = tokio::spawn(copy_loop(
            Direction::RemoteToLocal,
            remote_reader,
            local_writer,
            self.closer.clone(),
        ));

        let (sent, received) = tokio::join!(upstream, downstream);
        let sent = joined(Direction::LocalToRemote, sent);
        let received = joined(Direction::RemoteToLocal, received);

        BridgeStats {
            sent: sent.relayed,
            received: received.relayed,
            failed: sent.failed || received.failed,
        }
    }
}

fn joined(
    direction: Direction,
    result: Result<CopyOutcome, tokio::task::JoinError>,
) -> CopyOutcome {
    result.unwrap_or_else(|e| {
        tracing::error!("{} copy task failed: {}", direction, e);
        CopyOutcome {
            relayed: 0,
            failed: true,
        }
    })
}

/// Copy chunks from `from` to `to` until either fails or the pair closes
///
/// Returns the number of bytes relayed and whether a read or write failed.
async fn copy_loop(
    direction: Direction,
    mut from: Box<dyn ChunkReader>,
    mut to: Box<dyn ChunkWriter>,
    closer: PairCloser,
) -> CopyOutcome {
    let _guard = closer.close_on_drop();
    let mut relayed = 0u64;

    let outcome: Result<(), StreamError> = loop {
        let chunk = tokio::select! {
            biased;
            _ = closer.closed() => break Ok(()),
            read = from.read_chunk() => match read {
                Ok(chunk) => chunk,
                Err(e) => break Err(e),
            },
        };

        let len = chunk.len();
        tracing::trace!("{}: read {} bytes", direction, len);

        tokio::select! {
            biased;
            _ = closer.closed() => break Ok(()),
            written = to.write_chunk(chunk) => {
                if let Err(e) = written {
                    break Err(e);
                }
            }
        }

        tracing::trace!("{}: wrote {} bytes", direction, len);
        relayed += len as u64;
    };

    let failed = match outcome {
        Ok(()) => {
            tracing::debug!("{}: stopped, pair closed", direction);
            false
        }
        Err(StreamError::Closed) => {
            tracing::debug!("{}: end of stream", direction);
            false
        }
        Err(e) => {
            tracing::warn!("{}: {}", direction, e);
            true
        }
    };

    closer.close();

    match tokio::time::timeout(CLOSE_TIMEOUT, to.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("{}: close failed: {}", direction, e),
        Err(_) => tracing::debug!("{}: close timed out", direction),
    }

    CopyOutcome { relayed, failed }
}
