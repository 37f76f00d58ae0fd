//! Control-plane client boundary

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ControlPlaneError;
use crate::traits::DuplexSession;
use crate::types::{HostDescriptor, HostFilter, HostId, HostResource};

/// Abstraction over the cluster control plane
///
/// Provides host inventory and brokers host access sessions. Implementations
/// are shared between connection handlers and must be safe for concurrent use.
/// None of the calls are retried by callers.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Look up a host by its ID
    ///
    /// Returns `Ok(None)` when no host has that ID.
    async fn host_by_id(&self, id: &HostId) -> Result<Option<HostDescriptor>, ControlPlaneError>;

    /// List hosts matching a filter, in control-plane order
    async fn list_hosts(&self, filter: &HostFilter)
        -> Result<Vec<HostDescriptor>, ControlPlaneError>;

    /// Negotiate an access session to `service` on the host behind `resource`
    async fn request_host_access(
        &self,
        resource: &HostResource,
        service: &str,
        options: Option<&Value>,
    ) -> Result<DuplexSession, ControlPlaneError>;
}
