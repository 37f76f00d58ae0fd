//! hostlink-proxy: Local socket bridge to remote host access sessions
//!
//! The proxy resolves a target host once, listens on a local Unix socket and,
//! for every accepted connection, negotiates a host access session with the
//! control plane and relays chunks in both directions until either side ends.

pub mod adapter;
pub mod bridge;
pub mod resolver;
pub mod server;
pub mod session;

pub use bridge::{BridgeStats, ConnectionPair};
pub use resolver::HostResolver;
pub use server::Proxy;
pub use session::SessionEstablisher;
