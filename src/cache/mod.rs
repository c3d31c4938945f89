//! TTL cache in front of one-shot fetches.
//!
//! Entries are JSON envelopes `{storedAt, ttlMs, value}` written wholesale and never
//! patched. A lookup is a miss when the entry is absent, expired, or unreadable; the
//! cache never turns a bad entry into an error for the caller.

pub mod backend;
pub mod clock;

pub use backend::{KvBackend, MemoryBackend, SledBackend};
pub use clock::{Clock, ManualClock, SystemClock};

use crate::config::{CacheBackendKind, CacheConfig};
use crate::error::{ApiError, StorageError};
use crate::types::TimestampMs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    stored_at: TimestampMs,
    ttl_ms: u64,
    value: T,
}

/// Key/value cache with per-entry TTL
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// In-memory cache on the wall clock
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(SystemClock))
    }

    /// Build the cache described by configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self, ApiError> {
        let backend: Arc<dyn KvBackend> = match config.backend {
            CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
            CacheBackendKind::Sled => Arc::new(SledBackend::open(config.resolve_path()?)?),
        };
        Ok(Self::new(backend, Arc::new(SystemClock)))
    }

    /// Look up `key`; expired or unreadable entries count as a miss
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(key, error = %e, "Unreadable cache entry, treating as miss");
                return None;
            }
        };

        let age = self.clock.now_ms() - envelope.stored_at;
        if age > envelope.ttl_ms as i64 {
            debug!(key, age_ms = age, ttl_ms = envelope.ttl_ms, "Cache entry expired");
            return None;
        }
        Some(envelope.value)
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), StorageError> {
        let envelope = Envelope {
            stored_at: self.clock.now_ms(),
            ttl_ms: ttl.as_millis() as u64,
            value,
        };
        let bytes = serde_json::to_vec(&envelope)?;
        self.backend.put(key, bytes)
    }

    /// Drop the entry under `key`
    pub fn invalidate(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)
    }
}
