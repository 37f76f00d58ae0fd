//! Proxy configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default path of the local listen socket
pub const DEFAULT_LISTEN_PATH: &str = "/var/run/docker.sock";

/// Host access action that exposes the container engine socket
pub const DEFAULT_SERVICE: &str = "dockersocket";

/// Default size of a single local socket read
const DEFAULT_READ_BUFFER_SIZE: usize = 8192;

/// Configuration for the proxy daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Target host ID or name
    pub host: Option<String>,

    /// Path of the local Unix socket to listen on
    pub listen: PathBuf,

    /// Host access service requested for each connection
    pub service: String,

    /// Maximum bytes returned by one local socket read
    pub read_buffer_size: usize,

    /// Control plane endpoint and credentials
    pub control_plane: ControlPlaneConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: None,
            listen: PathBuf::from(DEFAULT_LISTEN_PATH),
            service: DEFAULT_SERVICE.to_string(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            control_plane: ControlPlaneConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Check that everything needed to start is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.host.as_deref() {
            None | Some("") => return Err(ConfigError::MissingField("host".into())),
            Some(_) => {}
        }
        if self.control_plane.url.is_empty() {
            return Err(ConfigError::MissingField("control_plane.url".into()));
        }
        if self.service.is_empty() {
            return Err(ConfigError::MissingField("service".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "read_buffer_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Control plane API endpoint and credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Base URL of the v1 API (e.g. `http://rancher:8080/v1`)
    pub url: String,

    /// API access key
    pub access_key: Option<String>,

    /// API secret key
    pub secret_key: Option<String>,
}
