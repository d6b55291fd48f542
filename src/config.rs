//! Catalog configuration
//!
//! Loaded from a JSON file. Every key has a default except `index_path`,
//! which only the command line tool needs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CONFIG_READ_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_FAILED",
            ConfigError::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Provider ID stamped on every record this catalog writes or returns
    #[serde(default = "default_source_id")]
    pub source_id: String,

    /// JSON snapshot file backing the in-memory index
    #[serde(default)]
    pub index_path: Option<PathBuf>,

    /// Make every batch write visible before returning
    #[serde(default = "default_force_auto_commit")]
    pub force_auto_commit: bool,

    /// Rows returned when a request asks for everything
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Page size the command line tool uses when none is given
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_source_id() -> String {
    "metacat".to_string()
}
fn default_force_auto_commit() -> bool {
    true
}
fn default_max_page_size() -> i64 {
    i64::from(i32::MAX)
}
fn default_page_size() -> i64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            index_path: None,
            force_auto_commit: default_force_auto_commit(),
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
            log_level: default_log_level(),
        }
    }
}

impl CatalogConfig {
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: CatalogConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.source_id.trim().is_empty() {
            return Err(ConfigError::Invalid("source_id must not be blank".to_string()));
        }

        if self.max_page_size <= 0 {
            return Err(ConfigError::Invalid("max_page_size must be > 0".to_string()));
        }

        if self.default_page_size <= 0 {
            return Err(ConfigError::Invalid("default_page_size must be > 0".to_string()));
        }

        Ok(())
    }

    /// Backend row limit as a count.
    pub fn max_rows(&self) -> usize {
        usize::try_from(self.max_page_size).unwrap_or(usize::MAX)
    }
}
