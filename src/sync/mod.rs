//! Live subscriptions against the remote store.
//!
//! A `SubscriptionManager` owns every live query for one record type. Sources push
//! snapshots into a channel from whatever thread they run on; the host drains them
//! with `pump()`, which is the only place callbacks run. Within one subscription,
//! snapshots are applied in the order they were sent. Across subscriptions nothing
//! is promised.
//!
//! ```ignore
//! let mut docs = SubscriptionManager::new(source);
//! let handle = docs.subscribe(
//!     QueryDescriptor::documents_under("root"),
//!     |snapshot| println!("{} roots", snapshot.len()),
//!     |err| eprintln!("{}", err),
//! );
//! docs.pump();
//! handle.dispose();
//! ```

pub mod memory;
pub mod query;
pub mod source;

pub use memory::MemoryCollection;
pub use query::{Direction, FieldFilter, OrderBy, QueryDescriptor, Queryable};
pub use source::{ListenerGuard, LiveSource, SnapshotFetcher, SnapshotSink, SubscriptionId};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use source::{Delivery, Envelope};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle phase of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// No snapshot delivered yet
    Loading,
    /// At least one snapshot delivered
    Live,
    /// The last delivery was an error
    Failed,
}

/// Error reported on a subscription's error channel
#[derive(Debug, Clone)]
pub struct SyncError {
    pub subscription: SubscriptionId,
    pub query: QueryDescriptor,
    pub message: String,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subscription {} on {}: {}",
            self.subscription, self.query.collection, self.message
        )
    }
}

struct SharedState<T> {
    disposed: AtomicBool,
    /// Held for the duration of a callback; dispose waits on it
    dispatch: ReentrantMutex<()>,
    phase: Mutex<SubscriptionPhase>,
    latest: RwLock<Option<Arc<Vec<T>>>>,
    guard: Mutex<Option<ListenerGuard>>,
}

impl<T> SharedState<T> {
    fn new() -> Self {
        Self {
            disposed: AtomicBool::new(false),
            dispatch: ReentrantMutex::new(()),
            phase: Mutex::new(SubscriptionPhase::Loading),
            latest: RwLock::new(None),
            guard: Mutex::new(None),
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return false;
        }
        // Let an in-flight callback on another thread finish before returning
        let _dispatch = self.dispatch.lock();
        let guard = self.guard.lock().take();
        drop(guard);
        true
    }
}

/// Caller-held handle to one live subscription
pub struct SubscriptionHandle<T> {
    id: SubscriptionId,
    query: QueryDescriptor,
    shared: Arc<SharedState<T>>,
}

impl<T> Clone for SubscriptionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            query: self.query.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> SubscriptionHandle<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    /// Stop the subscription. Idempotent; no callback runs after this returns.
    pub fn dispose(&self) {
        if self.shared.dispose() {
            debug!(subscription = self.id, "Subscription disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    pub fn phase(&self) -> SubscriptionPhase {
        *self.shared.phase.lock()
    }

    /// True until the first snapshot arrives
    pub fn is_loading(&self) -> bool {
        self.phase() == SubscriptionPhase::Loading
    }

    /// Most recent snapshot, if any
    pub fn latest(&self) -> Option<Arc<Vec<T>>> {
        self.shared.latest.read().clone()
    }
}

type UpdateFn<T> = Box<dyn FnMut(SubscriptionId, &[T]) + Send>;
type ErrorFn = Box<dyn FnMut(&SyncError) + Send>;

struct Entry<T> {
    query: QueryDescriptor,
    shared: Arc<SharedState<T>>,
    on_update: UpdateFn<T>,
    on_error: ErrorFn,
}

/// Owner of all live subscriptions for one record type
pub struct SubscriptionManager<T> {
    source: Arc<dyn LiveSource<T>>,
    tx: mpsc::Sender<Envelope<T>>,
    rx: mpsc::Receiver<Envelope<T>>,
    next_id: SubscriptionId,
    entries: HashMap<SubscriptionId, Entry<T>>,
}

impl<T: Send + Sync + 'static> SubscriptionManager<T> {
    pub fn new(source: Arc<dyn LiveSource<T>>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    /// Open a live query.
    ///
    /// Never fails synchronously: a source that refuses the query reports the failure
    /// once through `on_error` on the next `pump()`.
    pub fn subscribe<U, E>(&mut self, query: QueryDescriptor, on_update: U, on_error: E) -> SubscriptionHandle<T>
    where
        U: FnMut(&[T]) + Send + 'static,
        E: FnMut(&SyncError) + Send + 'static,
    {
        let mut on_update = on_update;
        self.subscribe_keyed(query, move |_, items| on_update(items), on_error)
    }

    /// Like `subscribe`, but the update callback also receives the subscription id
    pub fn subscribe_keyed<U, E>(
        &mut self,
        query: QueryDescriptor,
        on_update: U,
        on_error: E,
    ) -> SubscriptionHandle<T>
    where
        U: FnMut(SubscriptionId, &[T]) + Send + 'static,
        E: FnMut(&SyncError) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let shared = Arc::new(SharedState::new());
        let sink = SnapshotSink::new(id, self.tx.clone());
        match self.source.listen(&query, sink) {
            Ok(guard) => {
                *shared.guard.lock() = Some(guard);
                info!(subscription = id, collection = %query.collection, "Subscription opened");
            }
            Err(e) => {
                warn!(subscription = id, error = %e, "Source refused subscription");
                let _ = self.tx.send(Envelope {
                    id,
                    delivery: Delivery::Failed(e.to_string()),
                });
            }
        }

        self.entries.insert(
            id,
            Entry {
                query: query.clone(),
                shared: Arc::clone(&shared),
                on_update: Box::new(on_update),
                on_error: Box::new(on_error),
            },
        );

        SubscriptionHandle { id, query, shared }
    }

    /// Apply every queued delivery in arrival order. Returns the number of snapshots applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            let Some(entry) = self.entries.get_mut(&envelope.id) else {
                debug!(subscription = envelope.id, "Dropping delivery for closed subscription");
                continue;
            };

            let shared = Arc::clone(&entry.shared);
            let _dispatch = shared.dispatch.lock();
            if shared.is_disposed() {
                continue;
            }

            match envelope.delivery {
                Delivery::Snapshot(items) => {
                    let snapshot = Arc::new(items);
                    *shared.phase.lock() = SubscriptionPhase::Live;
                    *shared.latest.write() = Some(Arc::clone(&snapshot));
                    debug!(subscription = envelope.id, size = snapshot.len(), "Applying snapshot");
                    (entry.on_update)(envelope.id, &snapshot);
                    applied += 1;
                }
                Delivery::Failed(message) => {
                    *shared.phase.lock() = SubscriptionPhase::Failed;
                    let error = SyncError {
                        subscription: envelope.id,
                        query: entry.query.clone(),
                        message,
                    };
                    warn!(%error, "Subscription error");
                    (entry.on_error)(&error);
                }
            }
        }

        self.entries.retain(|_, entry| !entry.shared.is_disposed());
        applied
    }

    /// Dispose a subscription by id
    pub fn dispose(&mut self, id: SubscriptionId) {
        if let Some(entry) = self.entries.remove(&id) {
            entry.shared.dispose();
        }
    }

    pub fn dispose_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.shared.dispose();
        }
    }

    /// Subscriptions not yet disposed
    pub fn active_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.shared.is_disposed())
            .count()
    }
}

impl<T> Drop for SubscriptionManager<T> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.shared.dispose();
        }
    }
}
