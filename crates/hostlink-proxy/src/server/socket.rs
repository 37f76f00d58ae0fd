//! Listen socket lifecycle
//!
//! The socket file is removed before binding (a stale file from a previous
//! run would make `bind` fail) and again when the listener is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::net::UnixListener;

use hostlink_core::error::ProxyError;

/// A bound listener that removes its socket file on drop
pub struct BoundSocket {
    listener: UnixListener,
    path: PathBuf,
}

impl BoundSocket {
    /// The bound listener
    pub fn listener(&self) -> &UnixListener {
        &self.listener
    }

    /// Path of the socket file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        if let Err(e) = remove_socket_file(&self.path) {
            tracing::warn!("Failed to remove socket {:?}: {}", self.path, e);
        }
    }
}

/// Remove a socket file
///
/// Returns `Ok(())` even if the file doesn't exist.
fn remove_socket_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Replace whatever is at `path` with a freshly bound socket
pub fn bind_socket(path: &Path) -> Result<BoundSocket, ProxyError> {
    if let Err(e) = remove_socket_file(path) {
        // bind below reports the real problem
        tracing::debug!("Could not remove stale socket {:?}: {}", path, e);
    }

    let listener = UnixListener::bind(path).map_err(|source| ProxyError::Bind {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(BoundSocket {
        listener,
        path: path.to_path_buf(),
    })
}
