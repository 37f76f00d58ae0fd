//! REST client for the control plane
//!
//! Talks to a Rancher-style v1 API: hosts are read from `/hosts`, and host
//! access sessions are requested by POSTing to one of the host's action URLs.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use hostlink_core::config::ControlPlaneConfig;
use hostlink_core::error::ControlPlaneError;
use hostlink_core::traits::{ControlPlane, DuplexSession};
use hostlink_core::types::{HostDescriptor, HostFilter, HostId, HostResource};

use crate::models::{Collection, HostAccess, HostRecord};
use crate::session::{BasicCredentials, WebSocketSession};

/// Control-plane client authenticated with an API key pair
#[derive(Clone)]
pub struct RancherClient {
    /// HTTP client (connection pool shared between clones)
    http: reqwest::Client,
    /// Base URL of the v1 API
    base_url: Url,
    /// API key pair, sent on REST calls and websocket upgrades
    credentials: Option<BasicCredentials>,
}

impl RancherClient {
    /// Create a client from configuration
    pub fn new(config: &ControlPlaneConfig) -> Result<Self, ControlPlaneError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| ControlPlaneError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ControlPlaneError::InvalidUrl(config.url.clone()));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ControlPlaneError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            credentials: config.access_key.clone().map(|username| BasicCredentials {
                username,
                password: config.secret_key.clone(),
            }),
        })
    }

    /// Base URL of the API
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an API URL from path segments below the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ControlPlaneError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ControlPlaneError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_ref())
            }
            None => request,
        }
    }

    /// GET a JSON resource; a 404 yields `Ok(None)`
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ControlPlaneError> {
        tracing::debug!("GET {}", url);

        let response = self
            .authorize(self.http.get(url.clone()).query(query))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        decode(check_status(response)?).await.map(Some)
    }
}

fn check_status(response: Response) -> Result<Response, ControlPlaneError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ControlPlaneError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ControlPlaneError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ControlPlaneError::Decode(e.to_string()))
}

#[async_trait]
impl ControlPlane for RancherClient {
    async fn host_by_id(&self, id: &HostId) -> Result<Option<HostDescriptor>, ControlPlaneError> {
        if id.as_str().is_empty() {
            return Ok(None);
        }

        let url = self.endpoint(&["hosts", id.as_str()])?;
        let record: Option<HostRecord> = self.get_json(url, &[]).await?;
        Ok(record.map(HostDescriptor::from))
    }

    async fn list_hosts(
        &self,
        filter: &HostFilter,
    ) -> Result<Vec<HostDescriptor>, ControlPlaneError> {
        let url = self.endpoint(&["hosts"])?;
        let collection: Collection<HostRecord> = self
            .get_json(url.clone(), &filter.query_pairs())
            .await?
            .ok_or_else(|| ControlPlaneError::UnexpectedStatus {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: url.to_string(),
            })?;

        Ok(collection
            .data
            .into_iter()
            .map(HostDescriptor::from)
            .collect())
    }

    async fn request_host_access(
        &self,
        resource: &HostResource,
        service: &str,
        options: Option<&Value>,
    ) -> Result<DuplexSession, ControlPlaneError> {
        let action_url = resource
            .action(service)
            .ok_or_else(|| ControlPlaneError::MissingAction {
                host: resource.id.clone(),
                action: service.to_string(),
            })?;

        let body = options.cloned().unwrap_or_else(|| Value::Object(Default::default()));

        tracing::debug!("POST {} (host {})", action_url, resource.id);
        let response = self
            .authorize(self.http.post(action_url).json(&body))
            .send()
            .await
            .map_err(|e| ControlPlaneError::Request(e.to_string()))?;

        let access: HostAccess = decode(check_status(response)?).await?;
        let session_url = access.session_url()?;

        let session = WebSocketSession::connect(&session_url, self.credentials.as_ref()).await?;
        tracing::debug!("Opened {} session to host {}", service, resource.id);

        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> RancherClient {
        RancherClient::new(&ControlPlaneConfig {
            url: url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("http://rancher:8080/v1");
        assert_eq!(
            client.endpoint(&["hosts", "1h1"]).unwrap().as_str(),
            "http://rancher:8080/v1/hosts/1h1"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = client("http://rancher:8080/v1/");
        assert_eq!(
            client.endpoint(&["hosts"]).unwrap().as_str(),
            "http://rancher:8080/v1/hosts"
        );
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://rancher:8080/v1");
        assert_eq!(
            client.endpoint(&["hosts", "a/b"]).unwrap().as_str(),
            "http://rancher:8080/v1/hosts/a%2Fb"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = RancherClient::new(&ControlPlaneConfig {
            url: "not a url".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ControlPlaneError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_missing_action() {
        let client = client("http://rancher:8080/v1");
        let resource = HostResource {
            id: "1h1".into(),
            ..Default::default()
        };

        let result = client
            .request_host_access(&resource, "dockersocket", None)
            .await;
        assert!(matches!(
            result,
            Err(ControlPlaneError::MissingAction { ref action, .. }) if action == "dockersocket"
        ));
    }
}
