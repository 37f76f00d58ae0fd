//! hostlink daemon
//!
//! Listens on a local Unix socket and tunnels every connection to the
//! container engine socket of a host managed by the control plane.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostlink_control::RancherClient;
use hostlink_core::config::{self, ProxyConfig};
use hostlink_proxy::Proxy;

#[derive(Parser)]
#[command(name = "hostlink")]
#[command(about = "Local socket proxy to a remote host's container engine")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target host ID or name
    #[arg(long, env = "HOSTLINK_HOST")]
    host: Option<String>,

    /// Local socket path to listen on
    #[arg(short, long, env = "HOSTLINK_LISTEN")]
    listen: Option<PathBuf>,

    /// Control plane API URL
    #[arg(long, env = "CATTLE_URL")]
    url: Option<String>,

    /// Control plane access key
    #[arg(long, env = "CATTLE_ACCESS_KEY")]
    access_key: Option<String>,

    /// Control plane secret key
    #[arg(long, env = "CATTLE_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Host access service to request
    #[arg(long)]
    service: Option<String>,

    /// Run in foreground with verbose output
    #[arg(short, long)]
    foreground: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command line and environment overrides
    fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(host) = self.host {
            config.host = Some(host);
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(url) = self.url {
            config.control_plane.url = url;
        }
        if let Some(access_key) = self.access_key {
            config.control_plane.access_key = Some(access_key);
        }
        if let Some(secret_key) = self.secret_key {
            config.control_plane.secret_key = Some(secret_key);
        }
        if let Some(service) = self.service {
            config.service = service;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.foreground { "debug" } else { &args.log_level };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                ProxyConfig::default()
            })
        } else {
            ProxyConfig::default()
        }
    };
    let config = args.apply(config);
    config.validate().context("Invalid configuration")?;

    let client = RancherClient::new(&config.control_plane)
        .context("Failed to create control plane client")?;
    tracing::info!("Using control plane at {}", client.base_url());

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    let proxy = Proxy::from_config(Arc::new(client), &config)?.with_shutdown_token(cancel);
    proxy.listen_and_serve().await?;

    tracing::info!("hostlink shutdown complete");
    Ok(())
}
