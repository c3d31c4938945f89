//! Engine configuration.
//!
//! Loaded by `ConfigLoader` from built-in defaults, the user config file, and
//! `ARCHIVE__*` environment variables, in increasing precedence.

pub mod loader;
pub mod sources;

pub use loader::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::tree::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache persistence medium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Sled,
}

fn default_document_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_resource_ttl_ms() -> u64 {
    10 * 60 * 1000
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Sled database path; None means the platform cache directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// TTL for cached document listings
    #[serde(default = "default_document_ttl_ms")]
    pub document_ttl_ms: u64,

    /// TTL for the cached resource catalog
    #[serde(default = "default_resource_ttl_ms")]
    pub resource_ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            path: None,
            document_ttl_ms: default_document_ttl_ms(),
            resource_ttl_ms: default_resource_ttl_ms(),
        }
    }
}

impl CacheConfig {
    pub fn document_ttl(&self) -> Duration {
        Duration::from_millis(self.document_ttl_ms)
    }

    pub fn resource_ttl(&self) -> Duration {
        Duration::from_millis(self.resource_ttl_ms)
    }

    /// Resolve the sled database location
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.path {
            if !path.as_os_str().is_empty() {
                return Ok(path.clone());
            }
        }
        let dirs = sources::project_dirs().ok_or_else(|| {
            ApiError::ConfigError("Could not determine platform cache directory".to_string())
        })?;
        Ok(dirs.cache_dir().join("cache.sled"))
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Cap for ancestor walks when rebuilding a breadcrumb from a deep link
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}
