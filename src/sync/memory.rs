//! In-process collection implementing both the live and one-shot read capabilities.
//!
//! Used by tests and by the `archive` binary to serve snapshot files. Every mutation
//! re-evaluates each listener's query and pushes the full result.

use super::query::{QueryDescriptor, Queryable};
use super::source::{ListenerGuard, LiveSource, SnapshotFetcher, SnapshotSink};
use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

struct Listener<T> {
    query: QueryDescriptor,
    sink: SnapshotSink<T>,
}

struct Inner<T> {
    name: String,
    records: RwLock<Vec<T>>,
    listeners: Mutex<HashMap<u64, Listener<T>>>,
    next_listener: AtomicU64,
    reject_next: Mutex<Option<String>>,
}

/// Shared in-memory collection
pub struct MemoryCollection<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for MemoryCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Queryable + Clone + Send + Sync + 'static> MemoryCollection<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_records(name, Vec::new())
    }

    pub fn with_records(name: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                records: RwLock::new(records),
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
                reject_next: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn records(&self) -> Vec<T> {
        self.inner.records.read().clone()
    }

    /// Replace the whole collection
    pub fn replace_all(&self, records: Vec<T>) {
        *self.inner.records.write() = records;
        self.notify();
    }

    /// Insert or replace a record by id
    pub fn upsert(&self, record: T) {
        {
            let mut records = self.inner.records.write();
            match records
                .iter_mut()
                .find(|r| r.record_id() == record.record_id())
            {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        self.notify();
    }

    pub fn remove(&self, id: &str) {
        self.inner.records.write().retain(|r| r.record_id() != id);
        self.notify();
    }

    /// Push a transient error to every listener
    pub fn fail_listeners(&self, message: &str) {
        for listener in self.inner.listeners.lock().values() {
            listener.sink.fail(message);
        }
    }

    /// Make the next `listen` call fail with `message`
    pub fn reject_next_listen(&self, message: impl Into<String>) {
        *self.inner.reject_next.lock() = Some(message.into());
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn notify(&self) {
        let records = self.inner.records.read();
        let mut listeners = self.inner.listeners.lock();
        listeners.retain(|_, listener| listener.sink.deliver(listener.query.apply(&records)));
        debug!(collection = %self.inner.name, listeners = listeners.len(), "Notified listeners");
    }
}

impl<T: Queryable + Clone + Send + Sync + 'static> LiveSource<T> for MemoryCollection<T> {
    fn listen(&self, query: &QueryDescriptor, sink: SnapshotSink<T>) -> Result<ListenerGuard, ApiError> {
        if let Some(message) = self.inner.reject_next.lock().take() {
            return Err(ApiError::SourceError(message));
        }
        if query.collection != self.inner.name {
            return Err(ApiError::SourceError(format!(
                "unknown collection {:?}",
                query.collection
            )));
        }

        let initial = query.apply(&self.inner.records.read());
        sink.deliver(initial);

        let key = self.inner.next_listener.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().insert(
            key,
            Listener {
                query: query.clone(),
                sink,
            },
        );

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Ok(ListenerGuard::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().remove(&key);
            }
        }))
    }
}

#[async_trait]
impl<T: Queryable + Clone + Send + Sync + 'static> SnapshotFetcher<T> for MemoryCollection<T> {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<Vec<T>, ApiError> {
        if query.collection != self.inner.name {
            return Err(ApiError::SourceError(format!(
                "unknown collection {:?}",
                query.collection
            )));
        }
        Ok(query.apply(&self.inner.records.read()))
    }
}
