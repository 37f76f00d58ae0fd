//! Local socket server
//!
//! Accepts connections on the listen socket and bridges each one to its own
//! host access session.

mod handler;
mod listener;
mod socket;

pub use handler::{ConnectionHandler, ConnectionState};
pub use listener::Proxy;
pub use socket::{bind_socket, BoundSocket};
