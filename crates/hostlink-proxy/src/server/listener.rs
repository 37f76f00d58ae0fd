//! Proxy listener
//!
//! Resolves the target host once, binds the local socket, and spawns a
//! handler task for each accepted connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hostlink_core::config::{ProxyConfig, DEFAULT_SERVICE};
use hostlink_core::error::{ConfigError, ProxyError};
use hostlink_core::traits::ControlPlane;
use hostlink_core::types::HostDescriptor;

use crate::adapter::DEFAULT_READ_SIZE;
use crate::resolver::HostResolver;
use crate::server::handler::{ConnectionHandler, ConnectionState};
use crate::server::socket::bind_socket;
use crate::session::SessionEstablisher;

/// Local socket proxy for one target host
pub struct Proxy {
    /// Control plane shared by all connections
    client: Arc<dyn ControlPlane>,
    /// Target host ID or name
    host: String,
    /// Path of the local listen socket
    listen: PathBuf,
    /// Host access service
    service: String,
    /// Maximum local read size
    read_size: usize,
    /// Cancellation token for shutdown
    shutdown_token: Option<CancellationToken>,
}

impl Proxy {
    /// Create a proxy for `host`, listening on `listen`
    pub fn new(
        client: Arc<dyn ControlPlane>,
        host: impl Into<String>,
        listen: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            host: host.into(),
            listen: listen.into(),
            service: DEFAULT_SERVICE.to_string(),
            read_size: DEFAULT_READ_SIZE,
            shutdown_token: None,
        }
    }

    /// Create a proxy from validated configuration
    pub fn from_config(
        client: Arc<dyn ControlPlane>,
        config: &ProxyConfig,
    ) -> Result<Self, ProxyError> {
        config.validate()?;
        let host = config
            .host
            .clone()
            .ok_or_else(|| ConfigError::MissingField("host".into()))?;

        Ok(Self::new(client, host, config.listen.clone())
            .with_service(config.service.clone())
            .with_read_size(config.read_buffer_size))
    }

    /// Request a different host access service
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the maximum size of one local read
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size;
        self
    }

    /// Set the shutdown token (call before listen_and_serve)
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = Some(token);
        self
    }

    /// Path of the listen socket
    pub fn listen_path(&self) -> &Path {
        &self.listen
    }

    /// Resolve the configured host identifier
    pub async fn resolve_host(&self) -> Result<HostDescriptor, ProxyError> {
        HostResolver::new(Arc::clone(&self.client))
            .resolve(&self.host)
            .await
    }

    /// Resolve the host, bind the socket and serve until failure or shutdown
    ///
    /// Host resolution, bind and accept failures are returned; failures of
    /// individual connections are logged and do not stop the proxy. Returns
    /// `Ok(())` only after the shutdown token is cancelled.
    pub async fn listen_and_serve(&self) -> Result<(), ProxyError> {
        let host = self.resolve_host().await?;
        tracing::info!("Found host: {}", host);

        let socket = bind_socket(&self.listen)?;
        tracing::info!("Listening on {:?}", socket.path());

        let handler = Arc::new(ConnectionHandler::new(
            host,
            SessionEstablisher::with_service(Arc::clone(&self.client), self.service.clone()),
            self.read_size,
        ));
        let shutdown = self.shutdown_token.clone().unwrap_or_default();
        let mut next_id: u64 = 0;

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Proxy shutting down");
                    return Ok(());
                }
                result = socket.listener().accept() => result,
            };

            let (stream, _addr) = accepted.map_err(ProxyError::Accept)?;
            next_id += 1;
            let id = next_id;
            tracing::info!("New connection {}", id);
            tracing::debug!("Connection {}: {}", id, ConnectionState::Accepted);

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                handler.handle(id, stream).await;
            });
        }
    }
}
