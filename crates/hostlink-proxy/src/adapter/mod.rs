//! Stream adapters for the local side of a bridge
//!
//! The remote side is adapted by `hostlink_control::WebSocketSession`; both
//! implement [`hostlink_core::traits::ChunkStream`].

mod local;

pub use local::{LocalStream, DEFAULT_READ_SIZE};
