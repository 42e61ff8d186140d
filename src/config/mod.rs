//! # Configuration
//!
//! TOML configuration for the store location and the transport backend.
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```toml
//! [storage]
//! data_dir = ".jetraay"
//! database_file = "jetraay.db"
//!
//! [transport]
//! backend = "curl"
//! timeout_ms = 5000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const DATA_DIR: &str = ".jetraay";
const DATABASE_FILE: &str = "jetraay.db";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the database. Relative paths resolve against the
    /// current working directory.
    pub data_dir: PathBuf,
    pub database_file: String,
    /// Keep everything in memory; nothing survives the process.
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            database_file: DATABASE_FILE.to_string(),
            in_memory: false,
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        let dir = if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&self.data_dir)
        };
        dir.join(&self.database_file)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportBackend {
    #[default]
    Reqwest,
    Curl,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub backend: TransportBackend,
    /// Zero disables the timeout.
    pub timeout_ms: u64,
    pub proxy_url: Option<String>,
    pub verify_ssl: bool,
    pub max_redirects: usize,
    pub curl_path: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: TransportBackend::Reqwest,
            timeout_ms: 30_000,
            proxy_url: None,
            verify_ssl: true,
            max_redirects: 10,
            curl_path: "curl".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}
