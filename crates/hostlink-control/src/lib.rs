//! hostlink-control: Control-plane client for hostlink
//!
//! Implements [`hostlink_core::traits::ControlPlane`] against a Rancher-style
//! v1 REST API. Host access sessions are websocket connections opened with
//! the token returned by the host's access action.

pub mod client;
mod models;
pub mod session;

pub use client::RancherClient;
pub use session::{BasicCredentials, WebSocketSession};
