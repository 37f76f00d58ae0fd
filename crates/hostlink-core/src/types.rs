//! Core domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of a host known to the control plane
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId(pub String);

impl HostId {
    /// Create a new host ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Resource handle for a host, as returned by the control plane
///
/// `actions` maps an action name (such as `dockersocket`) to the URL that
/// performs it. Host access sessions are requested through these URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResource {
    /// Resource ID
    #[serde(default)]
    pub id: String,
    /// Resource type (normally `host`)
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// Related resource links
    #[serde(default)]
    pub links: HashMap<String, String>,
    /// Available actions, keyed by name
    #[serde(default)]
    pub actions: HashMap<String, String>,
}

impl HostResource {
    /// URL of the named action, if the resource offers it
    pub fn action(&self, name: &str) -> Option<&str> {
        self.actions
            .get(name)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// A resolved host: identity, display name and resource handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDescriptor {
    /// Host identifier
    pub id: HostId,
    /// Display name (may be empty)
    pub name: String,
    /// Handle used to request access sessions
    pub resource: HostResource,
}

impl HostDescriptor {
    /// Create a descriptor from its parts
    pub fn new(id: impl Into<HostId>, name: impl Into<String>, resource: HostResource) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource,
        }
    }

    /// Name for log output; falls back to the ID for unnamed hosts
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

impl fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}

/// Filter for host listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFilter {
    /// Only hosts with exactly this name
    pub name: Option<String>,
}

impl HostFilter {
    /// Filter on host name equality
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Query parameters for this filter
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        pairs
    }
}
