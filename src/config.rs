//! Client configuration.
//!
//! A single TOML file describes the job-pool endpoint and submission
//! defaults. Locating the file is the caller's concern; only parsing and
//! the selector helpers live here.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_batch_size() -> usize {
    100
}

/// Client configuration for submission runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the job-pool service.
    pub server: String,

    /// Path to the access-token file.
    #[serde(default)]
    pub token: Option<PathBuf>,

    /// Base URL of the shared WebDAV store.
    #[serde(default)]
    pub webdav: Option<String>,

    /// Named cluster lists selectable at submission time.
    #[serde(default)]
    pub clusters: HashMap<String, Vec<String>>,

    /// Description sources per submission batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve a cluster selector: a named list from the configuration, or
    /// a comma-separated list of cluster URLs.
    pub fn resolve_clusters(&self, selector: &str) -> Vec<String> {
        if let Some(list) = self.clusters.get(selector) {
            return list.clone();
        }
        selector
            .split(',')
            .map(|cluster| cluster.trim().to_string())
            .filter(|cluster| !cluster.is_empty())
            .collect()
    }

    /// Resolve the WebDAV flag: absent → no shared store, bare flag → the
    /// configured base URL, explicit URL → that URL.
    pub fn webdav_base(&self, flag: Option<&str>) -> Option<String> {
        match flag {
            None => None,
            Some("") => self.webdav.clone(),
            Some(url) => Some(url.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        toml::from_str(
            r#"
            server = "https://pool.example.org"
            token = "/home/user/.config/gridspool/token"
            webdav = "https://dav.example.org/user"

            [clusters]
            default = ["https://cluster-a.example.org", "https://cluster-b.example.org"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_config() {
        let config = config();
        assert_eq!(config.server, "https://pool.example.org");
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.clusters["default"].len(), 2);
    }

    #[test]
    fn test_resolve_named_cluster_list() {
        let clusters = config().resolve_clusters("default");
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], "https://cluster-a.example.org");
    }

    #[test]
    fn test_resolve_comma_separated_clusters() {
        let clusters = config().resolve_clusters(
            "https://one.example.org, https://two.example.org",
        );
        assert_eq!(
            clusters,
            vec![
                "https://one.example.org".to_string(),
                "https://two.example.org".to_string()
            ]
        );
    }

    #[test]
    fn test_webdav_flag_resolution() {
        let config = config();
        assert_eq!(config.webdav_base(None), None);
        assert_eq!(
            config.webdav_base(Some("")),
            Some("https://dav.example.org/user".to_string())
        );
        assert_eq!(
            config.webdav_base(Some("https://other.example.org")),
            Some("https://other.example.org".to_string())
        );
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridspool.toml");
        std::fs::write(&path, "server = ").unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
