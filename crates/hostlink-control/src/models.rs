//! Wire representations of control-plane resources

use std::collections::HashMap;

use reqwest::Url;
use serde::Deserialize;

use hostlink_core::error::ControlPlaneError;
use hostlink_core::types::{HostDescriptor, HostId, HostResource};

/// Host resource as returned by `GET /hosts/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct HostRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "type", default)]
    resource_type: String,
    #[serde(default)]
    links: HashMap<String, String>,
    #[serde(default)]
    actions: HashMap<String, String>,
}

impl From<HostRecord> for HostDescriptor {
    fn from(record: HostRecord) -> Self {
        // Unnamed hosts are shown by their reported hostname
        let name = record
            .name
            .filter(|n| !n.is_empty())
            .or(record.hostname)
            .unwrap_or_default();

        HostDescriptor {
            id: HostId::new(record.id.clone()),
            name,
            resource: HostResource {
                id: record.id,
                resource_type: record.resource_type,
                links: record.links,
                actions: record.actions,
            },
        }
    }
}

/// Collection envelope used by list endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Response of a host access action
#[derive(Debug, Deserialize)]
pub(crate) struct HostAccess {
    pub url: String,
    pub token: String,
}

impl HostAccess {
    /// Websocket URL carrying the session token
    pub fn session_url(&self) -> Result<Url, ControlPlaneError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ControlPlaneError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        let scheme = match url.scheme() {
            "http" => Some("ws"),
            "https" => Some("wss"),
            "ws" | "wss" => None,
            other => {
                return Err(ControlPlaneError::InvalidUrl(format!(
                    "unsupported access scheme '{}' in {}",
                    other, self.url
                )))
            }
        };
        if let Some(scheme) = scheme {
            url.set_scheme(scheme).map_err(|_| {
                ControlPlaneError::InvalidUrl(format!("cannot use {} for {}", scheme, self.url))
            })?;
        }

        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }
}
