use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Upload size limit used when none (or zero) is configured: 10 MiB.
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 14641;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Absolute path of the directory blobs are kept in.
    pub state_dir: PathBuf,
    /// Largest accepted payload in bytes; `0` selects the default.
    pub max_content_length: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            state_dir: PathBuf::from("."),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// The upload limit actually enforced.
    pub fn upload_limit(&self) -> u64 {
        if self.max_content_length == 0 {
            DEFAULT_MAX_CONTENT_LENGTH
        } else {
            self.max_content_length
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:14641".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_content_length, 10 * 1024 * 1024);
        assert_eq!(c.upload_limit(), 10 * 1024 * 1024);
    }

    #[test]
    fn zero_limit_means_default() {
        let c = ServerConfig {
            max_content_length: 0,
            ..ServerConfig::default()
        };
        assert_eq!(c.upload_limit(), DEFAULT_MAX_CONTENT_LENGTH);
    }

    #[test]
    fn toml_partial_document() {
        let c = ServerConfig::from_toml_str(
            r#"
            state_dir = "/var/lib/yodo"
            max_content_length = 1024
            "#,
        )
        .unwrap();
        assert_eq!(c.state_dir, PathBuf::from("/var/lib/yodo"));
        assert_eq!(c.upload_limit(), 1024);
        assert_eq!(c.bind_addr, ServerConfig::default().bind_addr);
    }

    #[test]
    fn toml_rejects_bad_address() {
        let err = ServerConfig::from_toml_str(r#"bind_addr = "nowhere""#).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yodo.toml");
        std::fs::write(&path, "bind_addr = \"0.0.0.0:8080\"\n").unwrap();
        let c = ServerConfig::load(&path).unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
    }

    #[test]
    fn load_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/yodo.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
