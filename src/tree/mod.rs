//! Document tree mirror.
//!
//! Mirrors a flat, `parentPath`-linked document collection fed by any number of
//! sources. Each source's slice is replaced wholesale on every snapshot; the combined
//! view is rebuilt from the slices so it always matches the latest deliveries exactly.

pub mod ancestry;

pub use ancestry::Anomaly;

use crate::error::ApiError;
use crate::model::Document;
use crate::sync::SubscriptionId;
use crate::types::{DocumentId, ROOT_ANCHOR};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Default cap on ancestor walks
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Origin of a slice of documents.
///
/// Live slices sort before seeded ones, so a live copy of a document wins over a
/// cached one while both are present.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKey {
    Live(SubscriptionId),
    /// Seeded from a one-shot fetch for the given query key
    Seeded(String),
}

/// In-memory tree index over the latest snapshots
pub struct TreeStore {
    sources: BTreeMap<SourceKey, Vec<Document>>,
    documents: Vec<Document>,
    index: HashMap<DocumentId, usize>,
    children: HashMap<DocumentId, Vec<usize>>,
    omitted: HashSet<usize>,
    max_depth: usize,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl TreeStore {
    pub fn new(max_depth: usize) -> Self {
        Self {
            sources: BTreeMap::new(),
            documents: Vec::new(),
            index: HashMap::new(),
            children: HashMap::new(),
            omitted: HashSet::new(),
            max_depth,
        }
    }

    /// Build a store from a single slice
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut store = Self::default();
        store.apply_snapshot(SourceKey::Seeded(String::new()), documents);
        store
    }

    /// Replace the slice owned by `source`
    pub fn apply_snapshot(&mut self, source: SourceKey, documents: Vec<Document>) {
        debug!(source = ?source, size = documents.len(), "Applying document snapshot");
        self.sources.insert(source, documents);
        self.rebuild();
    }

    /// Forget the slice owned by `source`
    pub fn remove_source(&mut self, source: &SourceKey) {
        if self.sources.remove(source).is_some() {
            self.rebuild();
        }
    }

    pub fn has_source(&self, source: &SourceKey) -> bool {
        self.sources.contains_key(source)
    }

    fn rebuild(&mut self) {
        let mut documents = Vec::new();
        let mut index = HashMap::new();
        for slice in self.sources.values() {
            for doc in slice {
                if index.contains_key(&doc.id) {
                    continue;
                }
                index.insert(doc.id.clone(), documents.len());
                documents.push(doc.clone());
            }
        }

        let omitted = ancestry::unreachable(&documents, &index);
        if !omitted.is_empty() {
            let ids: Vec<&str> = omitted.iter().map(|&i| documents[i].id.as_str()).collect();
            warn!(count = omitted.len(), ids = ?ids, "Omitting documents detached from the anchor");
        }

        let mut children: HashMap<DocumentId, Vec<usize>> = HashMap::new();
        for (i, doc) in documents.iter().enumerate() {
            if omitted.contains(&i) {
                continue;
            }
            children.entry(doc.parent_path.clone()).or_default().push(i);
        }

        self.documents = documents;
        self.index = index;
        self.children = children;
        self.omitted = omitted;
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.documents[i])
    }

    /// True when the document is known but detached from the anchor
    pub fn is_omitted(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|i| self.omitted.contains(i))
            .unwrap_or(false)
    }

    /// Category roots, oldest first; undated roots go last, ties keep arrival order
    pub fn root_categories(&self) -> Vec<&Document> {
        let mut roots: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| doc.is_category())
            .collect();
        roots.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        roots
    }

    /// Direct children of `path`: containers first, then files, each in arrival order.
    ///
    /// An unknown path or an empty folder yields an empty list.
    pub fn children(&self, path: &str) -> Vec<&Document> {
        let Some(indices) = self.children.get(path) else {
            return Vec::new();
        };
        let (files, containers): (Vec<&Document>, Vec<&Document>) = indices
            .iter()
            .map(|&i| &self.documents[i])
            .partition(|doc| doc.is_file());
        containers.into_iter().chain(files).collect()
    }

    /// Documents cross-referenced to `tag`, in arrival order
    pub fn by_tag(&self, tag: &str) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|doc| doc.related_tag_id.as_deref() == Some(tag))
            .collect()
    }

    /// Chain from the top-level ancestor down to `id` (inclusive)
    pub fn ancestors(&self, id: &str) -> Result<Vec<&Document>, ApiError> {
        let &start = self
            .index
            .get(id)
            .ok_or_else(|| ApiError::NodeNotFound(id.to_string()))?;
        let chain = ancestry::chain_to_anchor(&self.documents, &self.index, start, self.max_depth)
            .map_err(|anomaly| {
                warn!(?anomaly, "Ancestor walk failed");
                ApiError::BrokenAncestry {
                    id: id.to_string(),
                    category: ROOT_ANCHOR.to_string(),
                }
            })?;
        Ok(chain.into_iter().map(|i| &self.documents[i]).collect())
    }

    /// Whether `path` is `category` itself or lies beneath it
    pub fn is_within(&self, category: &str, path: &str) -> bool {
        if category == path {
            return self.index.contains_key(path);
        }
        self.ancestors(path)
            .map(|chain| chain.iter().any(|doc| doc.id == category))
            .unwrap_or(false)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
