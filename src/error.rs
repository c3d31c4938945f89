//! Error types for the archive engine.
//!
//! `StorageError` covers the cache persistence surface. `ApiError` is what callers of the
//! engine see. Nothing here is fatal: structural anomalies in the remote data never become
//! errors, they are omitted from listings instead.

use thiserror::Error;

/// Errors raised by cache backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache path: {0}")]
    InvalidPath(String),
}

/// Errors surfaced to engine callers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Document {id} is a {kind}, not a folder")]
    NotAFolder { id: String, kind: &'static str },

    #[error("Document {id} is not a child of the current folder {path}")]
    NotInCurrentFolder { id: String, path: String },

    #[error("Breadcrumb index {index} out of range (length {len})")]
    BreadcrumbOutOfRange { index: usize, len: usize },

    #[error("Ancestry of {id} does not reach category {category}")]
    BrokenAncestry { id: String, category: String },

    #[error("Source error: {0}")]
    SourceError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
