//! Capabilities consumed from the remote store.

use super::query::QueryDescriptor;
use crate::error::ApiError;
use async_trait::async_trait;
use std::sync::mpsc;

/// Identifier of one live subscription, unique within its manager
pub type SubscriptionId = u64;

pub(crate) enum Delivery<T> {
    Snapshot(Vec<T>),
    Failed(String),
}

pub(crate) struct Envelope<T> {
    pub(crate) id: SubscriptionId,
    pub(crate) delivery: Delivery<T>,
}

/// Write end handed to a source for one subscription.
///
/// Every delivery is the complete current result set of the query.
pub struct SnapshotSink<T> {
    id: SubscriptionId,
    tx: mpsc::Sender<Envelope<T>>,
}

impl<T> Clone for SnapshotSink<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
        }
    }
}

impl<T> SnapshotSink<T> {
    pub(crate) fn new(id: SubscriptionId, tx: mpsc::Sender<Envelope<T>>) -> Self {
        Self { id, tx }
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.id
    }

    /// Push a full snapshot; returns false once the receiving manager is gone
    pub fn deliver(&self, items: Vec<T>) -> bool {
        self.tx
            .send(Envelope {
                id: self.id,
                delivery: Delivery::Snapshot(items),
            })
            .is_ok()
    }

    /// Report a transient failure on the subscription's error channel
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(Envelope {
                id: self.id,
                delivery: Delivery::Failed(message.into()),
            })
            .is_ok()
    }
}

/// Detaches a listener from its source when dropped
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Live query capability
pub trait LiveSource<T>: Send + Sync {
    /// Attach a listener for `query`. Snapshots flow through `sink` until the guard drops.
    fn listen(&self, query: &QueryDescriptor, sink: SnapshotSink<T>) -> Result<ListenerGuard, ApiError>;
}

/// One-shot read capability
#[async_trait]
pub trait SnapshotFetcher<T>: Send + Sync {
    async fn fetch(&self, query: &QueryDescriptor) -> Result<Vec<T>, ApiError>;
}
