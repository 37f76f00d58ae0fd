//! Unix socket chunk stream

use std::io;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use hostlink_core::error::StreamError;
use hostlink_core::traits::{ChunkReader, ChunkStream, ChunkWriter};

/// Default upper bound for a single read
pub const DEFAULT_READ_SIZE: usize = 8192;

/// Chunk stream over an accepted local connection
///
/// A chunk is whatever one `read` on the socket returns, up to the
/// configured read size.
pub struct LocalStream {
    stream: UnixStream,
    read_size: usize,
}

impl LocalStream {
    /// Wrap a connection using the default read size
    pub fn new(stream: UnixStream) -> Self {
        Self::with_read_size(stream, DEFAULT_READ_SIZE)
    }

    /// Wrap a connection with a custom read size
    pub fn with_read_size(stream: UnixStream, read_size: usize) -> Self {
        Self {
            stream,
            read_size: read_size.max(1),
        }
    }
}

impl ChunkStream for LocalStream {
    fn into_split(self: Box<Self>) -> (Box<dyn ChunkReader>, Box<dyn ChunkWriter>) {
        let (read_half, write_half) = self.stream.into_split();
        (
            Box::new(LocalReader {
                half: read_half,
                read_size: self.read_size,
            }),
            Box::new(LocalWriter {
                half: Some(write_half),
            }),
        )
    }
}

struct LocalReader {
    half: OwnedReadHalf,
    read_size: usize,
}

#[async_trait]
impl ChunkReader for LocalReader {
    async fn read_chunk(&mut self) -> Result<Bytes, StreamError> {
        let mut buf = BytesMut::zeroed(self.read_size);
        let n = self.half.read(&mut buf[..]).await?;
        if n == 0 {
            return Err(StreamError::Closed);
        }
        buf.truncate(n);
        Ok(buf.freeze())
    }
}

struct LocalWriter {
    /// `None` once closed
    half: Option<OwnedWriteHalf>,
}

#[async_trait]
impl ChunkWriter for LocalWriter {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        let half = self.half.as_mut().ok_or(StreamError::Closed)?;
        half.write_all(&chunk).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        let Some(mut half) = self.half.take() else {
            return Ok(());
        };
        match half.shutdown().await {
            Ok(()) => Ok(()),
            // Peer already gone
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
