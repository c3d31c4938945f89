//! Record types observed by the engine.
//!
//! The engine only ever reads these. Anything malformed on the wire is dropped at
//! ingestion with a warning; a bad record never poisons the rest of a snapshot.

pub mod document;
pub mod resource;

pub use document::{Document, DocumentKind, FileMeta, RawDocument};
pub use resource::{Resource, ResourceStatus};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Shape violations found while validating a wire record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record has no id")]
    MissingId,

    #[error("file document {0} has no url")]
    MissingUrl(String),

    #[error("{kind} document {id} carries file-only fields")]
    UnexpectedFileFields { id: String, kind: String },

    #[error("document {id} has unknown kind {kind:?}")]
    UnknownKind { id: String, kind: String },
}

/// Decode a JSON array of records, skipping entries that fail validation
pub fn decode_records<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Dropping malformed record");
                None
            }
        })
        .collect();
    if decoded.len() != total {
        warn!(
            kept = decoded.len(),
            dropped = total - decoded.len(),
            "Snapshot contained malformed records"
        );
    }
    decoded
}

/// Decode archive documents from raw JSON values
pub fn decode_documents(values: Vec<serde_json::Value>) -> Vec<Document> {
    decode_records(values)
}

/// Decode catalog resources from raw JSON values
pub fn decode_resources(values: Vec<serde_json::Value>) -> Vec<Resource> {
    decode_records(values)
}
