//! hostlink-core: Core abstractions and configuration for hostlink
//!
//! This crate provides the host descriptor types, the control-plane and
//! chunk-stream traits, error types, and configuration structures shared by
//! the control-plane client and the proxy.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ControlPlaneError, ProxyError, StreamError};
pub use types::{HostDescriptor, HostFilter, HostId, HostResource};
