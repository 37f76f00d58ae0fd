//! Shared test fixtures: a channel-backed remote session and a stub
//! control plane that hands each session's far end to the test.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::net::UnixStream;
use tokio::sync::mpsc;

use hostlink_core::error::{ControlPlaneError, StreamError};
use hostlink_core::traits::{ChunkReader, ChunkStream, ChunkWriter, ControlPlane, DuplexSession};
use hostlink_core::types::{HostDescriptor, HostFilter, HostId, HostResource};

/// Far end of a stubbed remote session, held by the test
pub struct RemoteEnd {
    /// Chunks the proxy wrote to the session
    pub rx: mpsc::Receiver<Bytes>,
    /// Chunks to deliver to the proxy
    pub tx: mpsc::Sender<Bytes>,
}

/// Message-oriented session over two channels
pub struct ChannelSession {
    rx: mpsc::Receiver<Bytes>,
    tx: mpsc::Sender<Bytes>,
}

pub fn channel_session() -> (ChannelSession, RemoteEnd) {
    let (to_remote_tx, to_remote_rx) = mpsc::channel(16);
    let (to_proxy_tx, to_proxy_rx) = mpsc::channel(16);
    (
        ChannelSession {
            rx: to_proxy_rx,
            tx: to_remote_tx,
        },
        RemoteEnd {
            rx: to_remote_rx,
            tx: to_proxy_tx,
        },
    )
}

impl ChunkStream for ChannelSession {
    fn into_split(self: Box<Self>) -> (Box<dyn ChunkReader>, Box<dyn ChunkWriter>) {
        (
            Box::new(ChannelReader { rx: self.rx }),
            Box::new(ChannelWriter { tx: Some(self.tx) }),
        )
    }
}

struct ChannelReader {
    rx: mpsc::Receiver<Bytes>,
}

#[async_trait]
impl ChunkReader for ChannelReader {
    async fn read_chunk(&mut self) -> Result<Bytes, StreamError> {
        self.rx.recv().await.ok_or(StreamError::Closed)
    }
}

struct ChannelWriter {
    tx: Option<mpsc::Sender<Bytes>>,
}

#[async_trait]
impl ChunkWriter for ChannelWriter {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StreamError> {
        let tx = self.tx.as_ref().ok_or(StreamError::Closed)?;
        tx.send(chunk).await.map_err(|_| StreamError::Closed)
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.tx.take();
        Ok(())
    }
}

/// Control plane with a fixed inventory and channel-backed sessions
pub struct StubControlPlane {
    hosts: Vec<HostDescriptor>,
    ends_tx: mpsc::UnboundedSender<RemoteEnd>,
    pub fail_access: AtomicBool,
    pub by_id_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub access_calls: AtomicUsize,
}

impl StubControlPlane {
    /// Create a stub; the receiver yields one `RemoteEnd` per opened session
    pub fn new(hosts: Vec<HostDescriptor>) -> (Self, mpsc::UnboundedReceiver<RemoteEnd>) {
        let (ends_tx, ends_rx) = mpsc::unbounded_channel();
        (
            Self {
                hosts,
                ends_tx,
                fail_access: AtomicBool::new(false),
                by_id_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                access_calls: AtomicUsize::new(0),
            },
            ends_rx,
        )
    }
}

#[async_trait]
impl ControlPlane for StubControlPlane {
    async fn host_by_id(&self, id: &HostId) -> Result<Option<HostDescriptor>, ControlPlaneError> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hosts.iter().find(|h| &h.id == id).cloned())
    }

    async fn list_hosts(
        &self,
        filter: &HostFilter,
    ) -> Result<Vec<HostDescriptor>, ControlPlaneError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .hosts
            .iter()
            .filter(|h| filter.name.as_deref() == Some(h.name.as_str()))
            .cloned()
            .collect())
    }

    async fn request_host_access(
        &self,
        resource: &HostResource,
        service: &str,
        _options: Option<&Value>,
    ) -> Result<DuplexSession, ControlPlaneError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_access.load(Ordering::SeqCst) {
            return Err(ControlPlaneError::Session(format!(
                "{} unavailable on {}",
                service, resource.id
            )));
        }

        let (session, end) = channel_session();
        self.ends_tx
            .send(end)
            .map_err(|_| ControlPlaneError::Session("test dropped receiver".into()))?;
        Ok(Box::new(session))
    }
}

pub fn host(id: &str, name: &str) -> HostDescriptor {
    let mut resource = HostResource {
        id: id.to_string(),
        resource_type: "host".to_string(),
        ..Default::default()
    };
    resource.actions.insert(
        "dockersocket".to_string(),
        format!("http://control-plane/v1/hosts/{}/?action=dockersocket", id),
    );
    HostDescriptor::new(id, name, resource)
}

/// Connect to the proxy socket, retrying until the listener is up
pub async fn connect(path: &Path) -> UnixStream {
    let mut last_err = None;
    for _ in 0..100 {
        match UnixStream::connect(path).await {
            Ok(stream) => return stream,
            Err(e) => {
                last_err = Some(e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
    panic!("Failed to connect to {:?}: {:?}", path, last_err);
}
