//! Archive documents: the nodes of the virtual filesystem.
//!
//! Documents arrive flat, each pointing at its container through `parentPath`.
//! The wire shape (`RawDocument`) is permissive; `Document` only exists in a shape
//! where file metadata is present exactly when the kind is `file`.

use super::RecordError;
use crate::sync::query::Queryable;
use crate::types::{DocumentId, TimestampMs, ROOT_ANCHOR};
use serde::{Deserialize, Serialize};

/// File payload metadata; only file documents carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub url: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

/// Document kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Root,
    Folder,
    File(FileMeta),
}

impl DocumentKind {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Root => "root",
            DocumentKind::Folder => "folder",
            DocumentKind::File(_) => "file",
        }
    }
}

/// Document as stored in the remote collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<TimestampMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_tag_id: Option<String>,
}

/// Validated archive document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", into = "RawDocument")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub kind: DocumentKind,
    /// Id of the containing node, or `ROOT_ANCHOR`
    pub parent_path: DocumentId,
    /// Absent while a write is still pending on the remote side
    pub created_at: Option<TimestampMs>,
    pub related_tag_id: Option<String>,
}

impl Document {
    pub fn root(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, DocumentKind::Root, ROOT_ANCHOR)
    }

    pub fn folder(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_path: impl Into<String>,
    ) -> Self {
        Self::new(id, title, DocumentKind::Folder, parent_path)
    }

    pub fn file(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_path: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let meta = FileMeta {
            url: url.into(),
            mime_type: None,
            size: None,
        };
        Self::new(id, title, DocumentKind::File(meta), parent_path)
    }

    fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: DocumentKind,
        parent_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            parent_path: parent_path.into(),
            created_at: None,
            related_tag_id: None,
        }
    }

    pub fn with_created_at(mut self, created_at: TimestampMs) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.related_tag_id = Some(tag.into());
        self
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, DocumentKind::Root)
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, DocumentKind::Folder)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, DocumentKind::File(_))
    }

    pub fn file_meta(&self) -> Option<&FileMeta> {
        match &self.kind {
            DocumentKind::File(meta) => Some(meta),
            _ => None,
        }
    }

    /// Top-level category: a root document hanging from the anchor
    pub fn is_category(&self) -> bool {
        self.is_root() && self.parent_path == ROOT_ANCHOR
    }
}

impl TryFrom<RawDocument> for Document {
    type Error = RecordError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err(RecordError::MissingId);
        }
        let has_file_fields = raw.url.is_some() || raw.mime_type.is_some() || raw.size.is_some();
        let kind = match raw.kind.as_str() {
            "file" => {
                let url = raw
                    .url
                    .ok_or_else(|| RecordError::MissingUrl(raw.id.clone()))?;
                DocumentKind::File(FileMeta {
                    url,
                    mime_type: raw.mime_type,
                    size: raw.size,
                })
            }
            "folder" | "root" if has_file_fields => {
                return Err(RecordError::UnexpectedFileFields {
                    id: raw.id,
                    kind: raw.kind,
                });
            }
            "folder" => DocumentKind::Folder,
            "root" => DocumentKind::Root,
            other => {
                return Err(RecordError::UnknownKind {
                    id: raw.id.clone(),
                    kind: other.to_string(),
                })
            }
        };
        Ok(Document {
            id: raw.id,
            title: raw.title,
            kind,
            parent_path: raw.parent_path,
            created_at: raw.created_at,
            related_tag_id: raw.related_tag_id,
        })
    }
}

impl From<Document> for RawDocument {
    fn from(doc: Document) -> Self {
        let kind = doc.kind.name().to_string();
        let (url, mime_type, size) = match doc.kind {
            DocumentKind::File(meta) => (Some(meta.url), meta.mime_type, meta.size),
            _ => (None, None, None),
        };
        RawDocument {
            id: doc.id,
            title: doc.title,
            kind,
            parent_path: doc.parent_path,
            url,
            mime_type,
            size,
            created_at: doc.created_at,
            related_tag_id: doc.related_tag_id,
        }
    }
}

impl Queryable for Document {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "type" => Some(self.kind.name().to_string()),
            "parentPath" => Some(self.parent_path.clone()),
            "relatedTagId" => self.related_tag_id.clone(),
            "title" => Some(self.title.clone()),
            _ => None,
        }
    }

    fn created_at(&self) -> Option<TimestampMs> {
        self.created_at
    }
}
