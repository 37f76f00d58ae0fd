//! Chunk stream traits
//!
//! A chunk is whatever the transport delivers as one unit: the bytes of one
//! socket read, or the payload of one websocket message. Implementations must
//! never split or merge chunks.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StreamError;

/// Read half of a chunk stream
#[async_trait]
pub trait ChunkReader: Send {
    /// Wait for the next chunk
    ///
    /// Returns `StreamError::Closed` at end of stream.
    async fn read_chunk(&mut self) -> Result<Bytes, StreamError>;
}

/// Write half of a chunk stream
#[async_trait]
pub trait ChunkWriter: Send {
    /// Write `chunk` as a single transport unit
    ///
    /// Completes once the transport has accepted the chunk, not when the
    /// peer has received it.
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError>;

    /// Close the write side of the stream
    ///
    /// Closing an already closed writer returns `Ok(())`.
    async fn close(&mut self) -> Result<(), StreamError>;
}

/// A duplex transport that can be split into independent halves
pub trait ChunkStream: Send {
    /// Split into read and write halves usable from separate tasks
    fn into_split(self: Box<Self>) -> (Box<dyn ChunkReader>, Box<dyn ChunkWriter>);
}

/// Opaque duplex session returned by host access negotiation
pub type DuplexSession = Box<dyn ChunkStream>;
