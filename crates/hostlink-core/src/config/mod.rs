//! Configuration management for hostlink

mod proxy;

pub use proxy::{ControlPlaneConfig, ProxyConfig, DEFAULT_LISTEN_PATH, DEFAULT_SERVICE};

use crate::error::ConfigError;
use std::io;
use std::path::{Path, PathBuf};

/// `hostlink/config.toml` under the platform config directory
/// (`~/.config` on Linux), or the working directory when there is none
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hostlink")
        .join("config.toml")
}

/// Read a proxy configuration file
///
/// Keys absent from the file keep their defaults; command line flags are
/// applied on top by the caller.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e)),
    })?;

    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("hostlink/config.toml"));
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
host = "host-A"
listen = "/tmp/hostlink.sock"

[control_plane]
url = "http://rancher.local:8080/v1"
access_key = "ak"
secret_key = "sk"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.host.as_deref(), Some("host-A"));
        assert_eq!(config.listen, PathBuf::from("/tmp/hostlink.sock"));
        assert_eq!(config.service, DEFAULT_SERVICE);
        assert_eq!(config.control_plane.access_key.as_deref(), Some("ak"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = [").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
