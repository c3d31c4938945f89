//! Core types shared across the archive engine.

/// DocumentId: opaque, stable identifier of a document in the archive tree
pub type DocumentId = String;

/// ResourceId: opaque identifier of a catalog resource
pub type ResourceId = String;

/// Timestamp in milliseconds since the Unix epoch
pub type TimestampMs = i64;

/// Sentinel `parentPath` marking the top of the tree (category roots hang from it)
pub const ROOT_ANCHOR: &str = "root";

/// Sentinel meaning "no restriction" for type and term selections
pub const ALL: &str = "ALL";

/// Collection name of archive documents in the remote store
pub const DOCUMENTS_COLLECTION: &str = "documents";

/// Collection name of catalog resources in the remote store
pub const RESOURCES_COLLECTION: &str = "resources";

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> TimestampMs {
    chrono::Utc::now().timestamp_millis()
}
