//! Host resolution
//!
//! A host identifier may be either an opaque control-plane ID or a host
//! name. IDs are tried first; names fall back to a filtered listing.

use std::sync::Arc;

use hostlink_core::error::ProxyError;
use hostlink_core::traits::ControlPlane;
use hostlink_core::types::{HostDescriptor, HostFilter, HostId};

/// Resolves host identifiers through the control plane
pub struct HostResolver {
    client: Arc<dyn ControlPlane>,
}

impl HostResolver {
    /// Create a resolver backed by `client`
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Resolve `identifier` as an ID, then as a name
    ///
    /// With several hosts sharing the name, the first one in listing order
    /// is returned.
    pub async fn resolve(&self, identifier: &str) -> Result<HostDescriptor, ProxyError> {
        if let Some(host) = self.client.host_by_id(&HostId::new(identifier)).await? {
            tracing::debug!("Resolved {} by ID", identifier);
            return Ok(host);
        }

        let hosts = self
            .client
            .list_hosts(&HostFilter::by_name(identifier))
            .await?;

        if hosts.len() > 1 {
            tracing::warn!(
                "{} hosts are named {}, using {}",
                hosts.len(),
                identifier,
                hosts[0].id
            );
        }

        hosts
            .into_iter()
            .next()
            .ok_or_else(|| ProxyError::HostNotFound(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hostlink_core::error::ControlPlaneError;
    use hostlink_core::traits::DuplexSession;
    use hostlink_core::types::HostResource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Inventory-only control plane
    struct Inventory {
        hosts: Vec<HostDescriptor>,
        lookup_fails: bool,
        listing_fails: bool,
        list_calls: AtomicUsize,
    }

    impl Inventory {
        fn new(hosts: Vec<HostDescriptor>) -> Self {
            Self {
                hosts,
                lookup_fails: false,
                listing_fails: false,
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ControlPlane for Inventory {
        async fn host_by_id(
            &self,
            id: &HostId,
        ) -> Result<Option<HostDescriptor>, ControlPlaneError> {
            if self.lookup_fails {
                return Err(ControlPlaneError::UnexpectedStatus {
                    status: 500,
                    url: format!("/v1/hosts/{}", id),
                });
            }
            Ok(self.hosts.iter().find(|h| &h.id == id).cloned())
        }

        async fn list_hosts(
            &self,
            filter: &HostFilter,
        ) -> Result<Vec<HostDescriptor>, ControlPlaneError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.listing_fails {
                return Err(ControlPlaneError::Request("connection refused".into()));
            }
            Ok(self
                .hosts
                .iter()
                .filter(|h| filter.name.as_deref() == Some(h.name.as_str()))
                .cloned()
                .collect())
        }

        async fn request_host_access(
            &self,
            _resource: &HostResource,
            _service: &str,
            _options: Option<&serde_json::Value>,
        ) -> Result<DuplexSession, ControlPlaneError> {
            Err(ControlPlaneError::Session("not supported".into()))
        }
    }

    fn host(id: &str, name: &str) -> HostDescriptor {
        HostDescriptor::new(id, name, HostResource::default())
    }

    #[tokio::test]
    async fn test_resolve_by_id() {
        let inventory = Arc::new(Inventory::new(vec![host("1h1", "host-A")]));
        let resolver = HostResolver::new(inventory.clone());

        let resolved = resolver.resolve("1h1").await.unwrap();
        assert_eq!(resolved.name, "host-A");
        assert_eq!(inventory.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_by_name() {
        let inventory = Arc::new(Inventory::new(vec![host("1h1", "host-A")]));
        let resolver = HostResolver::new(inventory.clone());

        let resolved = resolver.resolve("host-A").await.unwrap();
        assert_eq!(resolved.id.as_str(), "1h1");
        assert_eq!(inventory.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_first_wins() {
        let inventory = Arc::new(Inventory::new(vec![
            host("1h2", "twin"),
            host("1h3", "twin"),
        ]));
        let resolver = HostResolver::new(inventory);

        assert_eq!(resolver.resolve("twin").await.unwrap().id.as_str(), "1h2");
    }

    #[tokio::test]
    async fn test_unknown_host_not_found() {
        let resolver = HostResolver::new(Arc::new(Inventory::new(vec![host("1h1", "host-A")])));

        let err = resolver.resolve("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn test_listing_failure_is_transport_error() {
        let mut inventory = Inventory::new(vec![]);
        inventory.listing_fails = true;
        let resolver = HostResolver::new(Arc::new(inventory));

        let err = resolver.resolve("host-A").await.unwrap_err();
        assert!(matches!(err, ProxyError::ControlPlane(ControlPlaneError::Request(_))));
    }

    #[tokio::test]
    async fn test_lookup_failure_skips_listing() {
        let mut inventory = Inventory::new(vec![host("1h1", "host-A")]);
        inventory.lookup_fails = true;
        let inventory = Arc::new(inventory);
        let resolver = HostResolver::new(inventory.clone());

        let err = resolver.resolve("host-A").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            ProxyError::ControlPlane(ControlPlaneError::UnexpectedStatus { status: 500, .. })
        ));
        assert_eq!(inventory.list_calls.load(Ordering::SeqCst), 0);
    }
}
