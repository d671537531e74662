use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServeError, ServeResult};

/// Environment variables that override file or default settings.
pub mod env {
    pub const HTTP_ADDR: &str = "UFS_HTTP_ADDR";
    pub const STREAM_ADDR: &str = "UFS_STREAM_ADDR";
    pub const METADATA_FILE: &str = "UFS_METADATA_FILE";
    pub const BLOB_ROOT: &str = "UFS_BLOB_ROOT";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address of the unary (HTTP) binding.
    pub http_addr: SocketAddr,
    /// Listen address of the streaming binding.
    pub stream_addr: SocketAddr,
    /// Persisted metadata document.
    pub metadata_file: PathBuf,
    /// Base directory for relative blob paths; the document's directory if unset.
    pub blob_root: Option<PathBuf>,
    /// Concurrent calls per binding. A streaming read holds its slot until done.
    pub max_workers: usize,
    /// Chunk size used when a read asks for `chunk_size <= 0`.
    pub default_chunk_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            stream_addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            metadata_file: PathBuf::from("files/metadata.json"),
            blob_root: None,
            max_workers: 10,
            default_chunk_size: ufs_protocol::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> ServeResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> ServeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> ServeResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the names in [`env`].
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ServeResult<Self> {
        if let Some(v) = lookup(env::HTTP_ADDR) {
            self.http_addr = parse_addr(env::HTTP_ADDR, &v)?;
        }
        if let Some(v) = lookup(env::STREAM_ADDR) {
            self.stream_addr = parse_addr(env::STREAM_ADDR, &v)?;
        }
        if let Some(v) = lookup(env::METADATA_FILE) {
            self.metadata_file = PathBuf::from(v);
        }
        if let Some(v) = lookup(env::BLOB_ROOT) {
            self.blob_root = Some(PathBuf::from(v));
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ServeResult<()> {
        if self.max_workers == 0 {
            return Err(ServeError::Config("max_workers must be at least 1".into()));
        }
        if self.default_chunk_size == 0 {
            return Err(ServeError::Config("default_chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_addr(key: &str, value: &str) -> ServeResult<SocketAddr> {
    value
        .parse()
        .map_err(|e| ServeError::Config(format!("{key}={value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.http_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.stream_addr, "127.0.0.1:50051".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_workers, 10);
        assert_eq!(c.default_chunk_size, 8192);
        assert!(c.blob_root.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            stream_addr = "0.0.0.0:6000"
            metadata_file = "/srv/ufs/metadata.json"
            max_workers = 4
            "#,
        )
        .unwrap();
        assert_eq!(c.stream_addr, "0.0.0.0:6000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.metadata_file, PathBuf::from("/srv/ufs/metadata.json"));
        assert_eq!(c.max_workers, 4);
        assert_eq!(c.http_addr, ServerConfig::default().http_addr);
    }

    #[test]
    fn zero_workers_rejected() {
        let err = ServerConfig::from_toml_str("max_workers = 0").unwrap_err();
        assert!(matches!(err, ServeError::Config(_)));
    }

    #[test]
    fn toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ufs.toml");
        let mut config = ServerConfig::default();
        config.blob_root = Some(PathBuf::from("/data"));
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(ServerConfig::from_toml_file(&path).unwrap(), config);
    }

    #[test]
    fn overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (env::HTTP_ADDR, "0.0.0.0:8080"),
            (env::METADATA_FILE, "/tmp/meta.json"),
            (env::BLOB_ROOT, "/tmp/blobs"),
        ]);
        let c = ServerConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.http_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.stream_addr, ServerConfig::default().stream_addr);
        assert_eq!(c.metadata_file, PathBuf::from("/tmp/meta.json"));
        assert_eq!(c.blob_root, Some(PathBuf::from("/tmp/blobs")));
    }

    #[test]
    fn bad_override_address() {
        let err = ServerConfig::default()
            .with_overrides(|k| (k == env::STREAM_ADDR).then(|| "nowhere".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServeError::Config(msg) if msg.contains(env::STREAM_ADDR)));
    }
}
