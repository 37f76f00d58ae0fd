//! Core trait definitions

mod control_plane;
mod stream;

pub use control_plane::ControlPlane;
pub use stream::{ChunkReader, ChunkStream, ChunkWriter, DuplexSession};
