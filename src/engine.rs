//! Archive engine facade.
//!
//! `ArchiveEngine` wires the tree mirror, the per-category cursors, the resource
//! catalog and the cache to a pair of remote collections. Live snapshots are queued
//! by the sources and applied on `pump()`; one-shot priming fetches go through the
//! cache and are versioned so a slow response never overwrites fresher state.

use crate::cache::CacheLayer;
use crate::catalog::{CourseGroup, FilterConfig, ResourceCatalog, SavedSet};
use crate::config::EngineConfig;
use crate::error::ApiError;
use crate::fetch::{fetch_versioned, FetchOrigin, RequestSequencer};
use crate::model::{Document, Resource};
use crate::navigation::{Breadcrumb, NavigationCursor, NavigationManager};
use crate::sync::{
    LiveSource, QueryDescriptor, SnapshotFetcher, SubscriptionHandle, SubscriptionManager,
    SyncError,
};
use crate::tree::{SourceKey, TreeStore};
use crate::types::{DocumentId, ROOT_ANCHOR};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of a priming fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeOutcome {
    /// The fetched data was installed
    Applied(FetchOrigin),
    /// A newer request or a live snapshot got there first
    Discarded,
}

/// Engine over one document collection and one resource collection
pub struct ArchiveEngine {
    config: EngineConfig,
    cache: CacheLayer,
    tree: Arc<RwLock<TreeStore>>,
    catalog: Arc<RwLock<ResourceCatalog>>,
    navigation: Mutex<NavigationManager>,
    documents: Mutex<SubscriptionManager<Document>>,
    resources: Mutex<SubscriptionManager<Resource>>,
    document_fetcher: Arc<dyn SnapshotFetcher<Document>>,
    resource_fetcher: Arc<dyn SnapshotFetcher<Resource>>,
    /// Live listing per watched folder path
    paths: Mutex<HashMap<DocumentId, SubscriptionHandle<Document>>>,
    tags: Mutex<HashMap<String, SubscriptionHandle<Document>>>,
    catalog_subscription: Mutex<Option<SubscriptionHandle<Resource>>>,
    errors: Arc<Mutex<Vec<SyncError>>>,
    roots_requests: RequestSequencer,
    catalog_requests: RequestSequencer,
}

impl ArchiveEngine {
    /// Create an engine. Each collaborator serves both live queries and one-shot reads.
    pub fn new<D, R>(config: EngineConfig, cache: CacheLayer, documents: D, resources: R) -> Self
    where
        D: LiveSource<Document> + SnapshotFetcher<Document> + 'static,
        R: LiveSource<Resource> + SnapshotFetcher<Resource> + 'static,
    {
        let documents = Arc::new(documents);
        let resources = Arc::new(resources);
        let document_live: Arc<dyn LiveSource<Document>> = documents.clone();
        let resource_live: Arc<dyn LiveSource<Resource>> = resources.clone();

        Self {
            tree: Arc::new(RwLock::new(TreeStore::new(config.navigation.max_depth))),
            catalog: Arc::new(RwLock::new(ResourceCatalog::new())),
            navigation: Mutex::new(NavigationManager::new()),
            documents: Mutex::new(SubscriptionManager::new(document_live)),
            resources: Mutex::new(SubscriptionManager::new(resource_live)),
            document_fetcher: documents,
            resource_fetcher: resources,
            paths: Mutex::new(HashMap::new()),
            tags: Mutex::new(HashMap::new()),
            catalog_subscription: Mutex::new(None),
            errors: Arc::new(Mutex::new(Vec::new())),
            roots_requests: RequestSequencer::new(),
            catalog_requests: RequestSequencer::new(),
            cache,
            config,
        }
    }

    /// Create an engine whose cache is built from `config`
    pub fn from_config<D, R>(config: EngineConfig, documents: D, resources: R) -> Result<Self, ApiError>
    where
        D: LiveSource<Document> + SnapshotFetcher<Document> + 'static,
        R: LiveSource<Resource> + SnapshotFetcher<Resource> + 'static,
    {
        let cache = CacheLayer::from_config(&config.cache)?;
        Ok(Self::new(config, cache, documents, resources))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    // ---- live plumbing ----

    fn error_sink(&self) -> impl FnMut(&SyncError) + Send + 'static {
        let errors = Arc::clone(&self.errors);
        move |error: &SyncError| errors.lock().push(error.clone())
    }

    /// Open a live listing for `path` unless one is already open
    fn watch_path(&self, path: &str) {
        let mut paths = self.paths.lock();
        if paths.contains_key(path) {
            return;
        }

        let query = QueryDescriptor::documents_under(path);
        let seeded = SourceKey::Seeded(query.cache_key());
        let tree = Arc::clone(&self.tree);
        let handle = self.documents.lock().subscribe_keyed(
            query,
            move |id, snapshot: &[Document]| {
                let mut tree = tree.write();
                tree.apply_snapshot(SourceKey::Live(id), snapshot.to_vec());
                tree.remove_source(&seeded);
            },
            self.error_sink(),
        );
        debug!(path = %path, subscription = handle.id(), "Watching folder");
        paths.insert(path.to_string(), handle);
    }

    fn unwatch_path(&self, path: &str) {
        let handle = self.paths.lock().remove(path);
        if let Some(handle) = handle {
            handle.dispose();
            let query = QueryDescriptor::documents_under(path);
            let mut tree = self.tree.write();
            tree.remove_source(&SourceKey::Live(handle.id()));
            tree.remove_source(&SourceKey::Seeded(query.cache_key()));
        }
    }

    /// Apply every queued snapshot and error. Returns the number of snapshots applied.
    pub fn pump(&self) -> usize {
        let documents = self.documents.lock().pump();
        let resources = self.resources.lock().pump();
        documents + resources
    }

    /// Take the errors reported since the last call
    pub fn drain_errors(&self) -> Vec<SyncError> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// True until `path` has data, live or seeded
    pub fn is_loading(&self, path: &str) -> bool {
        let live = self
            .paths
            .lock()
            .get(path)
            .map(|handle| handle.latest().is_some())
            .unwrap_or(false);
        if live {
            return false;
        }
        let seeded = SourceKey::Seeded(QueryDescriptor::documents_under(path).cache_key());
        !self.tree.read().has_source(&seeded)
    }

    // ---- tree ----

    /// Start mirroring the category roots
    pub fn open_roots(&self) {
        self.watch_path(ROOT_ANCHOR);
    }

    pub fn root_categories(&self) -> Vec<Document> {
        self.tree
            .read()
            .root_categories()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Children of `path` inside `category`.
    ///
    /// A path not mirrored yet yields an empty list; `is_loading` tells the two apart.
    pub fn children(&self, category_id: &str, path: &str) -> Result<Vec<Document>, ApiError> {
        let tree = self.tree.read();
        if tree.get(path).is_none() {
            return Ok(Vec::new());
        }
        if !tree.is_within(category_id, path) {
            return Err(ApiError::BrokenAncestry {
                id: path.to_string(),
                category: category_id.to_string(),
            });
        }
        Ok(tree.children(path).into_iter().cloned().collect())
    }

    /// Start mirroring the documents cross-referenced to `tag`
    pub fn watch_tag(&self, tag: &str) {
        let mut tags = self.tags.lock();
        if tags.contains_key(tag) {
            return;
        }
        let tree = Arc::clone(&self.tree);
        let handle = self.documents.lock().subscribe_keyed(
            QueryDescriptor::documents_tagged(tag),
            move |id, snapshot: &[Document]| {
                tree.write()
                    .apply_snapshot(SourceKey::Live(id), snapshot.to_vec());
            },
            self.error_sink(),
        );
        tags.insert(tag.to_string(), handle);
    }

    pub fn unwatch_tag(&self, tag: &str) {
        let handle = self.tags.lock().remove(tag);
        if let Some(handle) = handle {
            handle.dispose();
            self.tree
                .write()
                .remove_source(&SourceKey::Live(handle.id()));
        }
    }

    pub fn by_tag(&self, tag: &str) -> Vec<Document> {
        self.tree.read().by_tag(tag).into_iter().cloned().collect()
    }

    // ---- navigation ----

    fn category(&self, category_id: &str) -> Result<Document, ApiError> {
        self.tree
            .read()
            .get(category_id)
            .filter(|doc| doc.is_category())
            .cloned()
            .ok_or_else(|| ApiError::UnknownCategory(category_id.to_string()))
    }

    /// Open (or return to) a category's cursor and watch its current folder
    #[instrument(skip(self))]
    pub fn open_category(&self, category_id: &str) -> Result<NavigationCursor, ApiError> {
        let category = self.category(category_id)?;
        let cursor = self.navigation.lock().open(&category)?.clone();
        self.watch_path(cursor.current_path());
        Ok(cursor)
    }

    /// Position a category's cursor at an arbitrary folder, rebuilding the breadcrumb
    #[instrument(skip(self))]
    pub fn open_deep_link(&self, category_id: &str, folder_id: &str) -> Result<NavigationCursor, ApiError> {
        let cursor = NavigationCursor::restore(&self.tree.read(), category_id, folder_id)?;
        for crumb in cursor.breadcrumb() {
            self.watch_path(&crumb.path);
        }
        self.navigation.lock().insert(cursor.clone());
        Ok(cursor)
    }

    /// Enter `folder_id`, a folder listed directly under the category's current folder
    pub fn descend(&self, category_id: &str, folder_id: &str) -> Result<(), ApiError> {
        let folder = self
            .tree
            .read()
            .get(folder_id)
            .cloned()
            .ok_or_else(|| ApiError::NodeNotFound(folder_id.to_string()))?;
        self.navigation.lock().cursor_mut(category_id)?.descend(&folder)?;
        self.watch_path(folder_id);
        Ok(())
    }

    pub fn ascend(&self, category_id: &str) -> Result<(), ApiError> {
        self.navigation.lock().cursor_mut(category_id)?.ascend();
        Ok(())
    }

    pub fn jump_to(&self, category_id: &str, index: usize) -> Result<(), ApiError> {
        self.navigation.lock().cursor_mut(category_id)?.jump_to(index)
    }

    pub fn is_at_root(&self, category_id: &str) -> Result<bool, ApiError> {
        self.with_cursor(category_id, NavigationCursor::is_at_root)
    }

    pub fn breadcrumb(&self, category_id: &str) -> Result<Vec<Breadcrumb>, ApiError> {
        self.with_cursor(category_id, |cursor| cursor.breadcrumb().to_vec())
    }

    pub fn current_path(&self, category_id: &str) -> Result<String, ApiError> {
        self.with_cursor(category_id, |cursor| cursor.current_path().to_string())
    }

    /// Listing of the category's current folder
    pub fn current_children(&self, category_id: &str) -> Result<Vec<Document>, ApiError> {
        let path = self.current_path(category_id)?;
        self.children(category_id, &path)
    }

    fn with_cursor<F, T>(&self, category_id: &str, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&NavigationCursor) -> T,
    {
        self.navigation
            .lock()
            .cursor(category_id)
            .map(f)
            .ok_or_else(|| ApiError::UnknownCategory(category_id.to_string()))
    }

    /// Drop a category's cursor and stop watching every folder inside it
    #[instrument(skip(self))]
    pub fn close_category(&self, category_id: &str) {
        self.navigation.lock().close(category_id);

        let watched: Vec<String> = self
            .paths
            .lock()
            .keys()
            .filter(|path| path.as_str() != ROOT_ANCHOR)
            .cloned()
            .collect();
        let inside: Vec<String> = {
            let tree = self.tree.read();
            watched
                .into_iter()
                .filter(|path| tree.is_within(category_id, path))
                .collect()
        };
        for path in &inside {
            self.unwatch_path(path);
        }
        info!(category = %category_id, closed = inside.len(), "Category closed");
    }

    // ---- catalog ----

    /// Start the live approved-resource subscription
    pub fn open_catalog(&self) {
        let mut slot = self.catalog_subscription.lock();
        if slot.is_some() {
            return;
        }
        let catalog = Arc::clone(&self.catalog);
        let handle = self.resources.lock().subscribe(
            QueryDescriptor::approved_resources(),
            move |snapshot: &[Resource]| catalog.write().apply_snapshot(snapshot.to_vec()),
            self.error_sink(),
        );
        *slot = Some(handle);
    }

    pub fn catalog_is_loaded(&self) -> bool {
        self.catalog.read().is_loaded()
    }

    pub fn grouped_courses(&self, config: &FilterConfig, saved: &dyn SavedSet) -> Vec<CourseGroup> {
        self.catalog.read().grouped_courses(config, saved)
    }

    pub fn available_terms(&self) -> Vec<String> {
        self.catalog.read().available_terms().to_vec()
    }

    /// Forget the cached catalog and any priming fetch still in flight
    pub fn invalidate_catalog(&self) -> Result<(), ApiError> {
        self.catalog_requests.cancel_all();
        self.cache
            .invalidate(&QueryDescriptor::approved_resources().cache_key())?;
        Ok(())
    }

    // ---- priming ----

    /// Seed the root listing from the cache or a one-shot fetch
    pub async fn prime_roots(&self) -> Result<PrimeOutcome, ApiError> {
        let query = QueryDescriptor::documents_under(ROOT_ANCHOR);
        let fetched = fetch_versioned(
            &self.roots_requests,
            &self.cache,
            self.document_fetcher.as_ref(),
            &query,
            self.config.cache.document_ttl(),
        )
        .await?;
        let Some((documents, origin)) = fetched else {
            return Ok(PrimeOutcome::Discarded);
        };

        let live = self
            .paths
            .lock()
            .get(ROOT_ANCHOR)
            .map(|handle| handle.latest().is_some())
            .unwrap_or(false);
        if live {
            debug!("Root listing already live; ignoring primed copy");
            return Ok(PrimeOutcome::Discarded);
        }

        self.tree
            .write()
            .apply_snapshot(SourceKey::Seeded(query.cache_key()), documents);
        Ok(PrimeOutcome::Applied(origin))
    }

    /// Seed the catalog from the cache or a one-shot fetch
    pub async fn prime_catalog(&self) -> Result<PrimeOutcome, ApiError> {
        let fetched = fetch_versioned(
            &self.catalog_requests,
            &self.cache,
            self.resource_fetcher.as_ref(),
            &QueryDescriptor::approved_resources(),
            self.config.cache.resource_ttl(),
        )
        .await?;
        let Some((resources, origin)) = fetched else {
            return Ok(PrimeOutcome::Discarded);
        };
        if !self.catalog.write().seed(resources) {
            debug!("Catalog already live; ignoring primed copy");
            return Ok(PrimeOutcome::Discarded);
        }
        Ok(PrimeOutcome::Applied(origin))
    }
}
