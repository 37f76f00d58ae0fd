//! Websocket host access session
//!
//! Each websocket data message is one chunk. Binary messages are sent for
//! every written chunk; text messages received from the peer are passed
//! through as their UTF-8 bytes. Ping/pong frames are handled by tungstenite
//! and never surface as chunks.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use hostlink_core::error::{ControlPlaneError, StreamError};
use hostlink_core::traits::{ChunkReader, ChunkStream, ChunkWriter};

/// API key pair sent as HTTP basic auth
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Access key
    pub username: String,
    /// Secret key
    pub password: Option<String>,
}

impl BasicCredentials {
    /// `Authorization` header value
    pub fn header_value(&self) -> String {
        let pair = format!(
            "{}:{}",
            self.username,
            self.password.as_deref().unwrap_or_default()
        );
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(pair)
        )
    }
}

/// Websocket session to a host access endpoint
pub struct WebSocketSession<S = MaybeTlsStream<TcpStream>> {
    ws: WebSocketStream<S>,
}

impl WebSocketSession {
    /// Dial a host access URL (token already in the query string)
    ///
    /// `credentials` are sent on the upgrade request when given.
    pub async fn connect(
        url: &Url,
        credentials: Option<&BasicCredentials>,
    ) -> Result<Self, ControlPlaneError> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ControlPlaneError::InvalidUrl(format!("{}: {}", url.path(), e)))?;

        if let Some(credentials) = credentials {
            let value = HeaderValue::from_str(&credentials.header_value())
                .map_err(|e| ControlPlaneError::Session(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws, response) = connect_async(request)
            .await
            .map_err(|e| ControlPlaneError::Session(format!("{}: {}", url.path(), e)))?;

        tracing::trace!("Websocket handshake completed ({})", response.status());
        Ok(Self { ws })
    }
}

impl<S> WebSocketSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already established websocket
    pub fn from_stream(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }
}

impl<S> ChunkStream for WebSocketSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn into_split(self: Box<Self>) -> (Box<dyn ChunkReader>, Box<dyn ChunkWriter>) {
        let (sink, stream) = self.ws.split();
        (
            Box::new(WebSocketReader { stream }),
            Box::new(WebSocketWriter {
                sink,
                closed: false,
            }),
        )
    }
}

fn stream_error(err: WsError) -> StreamError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => StreamError::Closed,
        WsError::Io(e) => StreamError::Io(e),
        other => StreamError::Transport(other.to_string()),
    }
}

struct WebSocketReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> ChunkReader for WebSocketReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_chunk(&mut self) -> Result<Bytes, StreamError> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(stream_error(e)),
                None => return Err(StreamError::Closed),
            };

            match message {
                Message::Binary(data) => return Ok(Bytes::from(data)),
                Message::Text(text) => return Ok(Bytes::from(text)),
                Message::Close(frame) => {
                    tracing::debug!("Websocket closed by peer: {:?}", frame);
                    return Err(StreamError::Closed);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }
}

struct WebSocketWriter<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    closed: bool,
}

#[async_trait]
impl<S> ChunkWriter for WebSocketWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.sink
            .send(Message::Binary(chunk.to_vec()))
            .await
            .map_err(stream_error)
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.sink.close().await {
            Ok(()) => Ok(()),
            Err(e) => match stream_error(e) {
                StreamError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }
}
