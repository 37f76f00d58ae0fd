//! Core error types for hostlink

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Host identifier matched neither an ID nor a name
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// Control plane error
    #[error("Control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    /// Failed to bind the local listen socket
    #[error("Failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Accept loop failed
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ProxyError {
    /// Whether this error means the host does not exist, as opposed to the
    /// control plane being unreachable or misbehaving
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProxyError::HostNotFound(_))
    }
}

/// Errors returned by a control-plane client
#[derive(Error, Debug)]
pub enum ControlPlaneError {
    /// Request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Request(String),

    /// Control plane answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The host resource does not offer the requested access action
    #[error("Host {host} has no '{action}' action")]
    MissingAction { host: String, action: String },

    /// Access session could not be opened
    #[error("Session negotiation failed: {0}")]
    Session(String),

    /// Malformed control-plane URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors produced by chunk streams
#[derive(Error, Debug)]
pub enum StreamError {
    /// End of stream, or the stream was closed locally
    #[error("Stream closed")]
    Closed,

    /// I/O error on the underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport-level error (e.g. websocket protocol violation)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StreamError {
    /// Whether this is a plain end-of-stream rather than a failure
    pub fn is_closed(&self) -> bool {
        matches!(self, StreamError::Closed)
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}
