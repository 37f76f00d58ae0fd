//! Host access session negotiation

use std::sync::Arc;

use hostlink_core::error::ProxyError;
use hostlink_core::traits::{ControlPlane, DuplexSession};
use hostlink_core::types::HostDescriptor;

/// Opens host access sessions for a fixed service
pub struct SessionEstablisher {
    client: Arc<dyn ControlPlane>,
    service: String,
}

impl SessionEstablisher {
    /// Create an establisher for `service`
    pub fn with_service(client: Arc<dyn ControlPlane>, service: impl Into<String>) -> Self {
        Self {
            client,
            service: service.into(),
        }
    }

    /// Negotiate a session to the host; failures are not retried
    pub async fn establish(&self, host: &HostDescriptor) -> Result<DuplexSession, ProxyError> {
        let session = self
            .client
            .request_host_access(&host.resource, &self.service, None)
            .await?;
        Ok(session)
    }
}
