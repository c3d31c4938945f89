//! One-shot fetches behind the cache, with stale-response protection.
//!
//! Each fetch takes a ticket from a `RequestSequencer` before it suspends. When the
//! response comes back, only the holder of the newest ticket may write its result;
//! anything older is dropped instead of overwriting fresher state.

use crate::cache::CacheLayer;
use crate::error::ApiError;
use crate::sync::{QueryDescriptor, SnapshotFetcher};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Monotonic request id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Hands out request tickets for one logical slot
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket becomes stale
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate every outstanding ticket
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Where a fetched value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cache,
    Remote,
}

/// Serve `query` from the cache, falling back to `fetcher` and caching the result.
///
/// A cache write failure is logged and otherwise ignored; the fetched value is still returned.
pub async fn fetch_cached<T, F>(
    cache: &CacheLayer,
    fetcher: &F,
    query: &QueryDescriptor,
    ttl: Duration,
) -> Result<(Vec<T>, FetchOrigin), ApiError>
where
    T: Serialize + DeserializeOwned + Send,
    F: SnapshotFetcher<T> + ?Sized,
{
    let key = query.cache_key();
    if let Some(hit) = cache.get::<Vec<T>>(&key) {
        debug!(key = %key, size = hit.len(), "Cache hit");
        return Ok((hit, FetchOrigin::Cache));
    }

    let fetched = fetcher.fetch(query).await?;
    store(cache, &key, &fetched, ttl);
    Ok((fetched, FetchOrigin::Remote))
}

/// Like `fetch_cached`, but versioned against `sequencer`.
///
/// Returns `None` when a newer request began while this one was waiting on the
/// fetcher. A stale response is neither returned nor written to the cache.
pub async fn fetch_versioned<T, F>(
    sequencer: &RequestSequencer,
    cache: &CacheLayer,
    fetcher: &F,
    query: &QueryDescriptor,
    ttl: Duration,
) -> Result<Option<(Vec<T>, FetchOrigin)>, ApiError>
where
    T: Serialize + DeserializeOwned + Send,
    F: SnapshotFetcher<T> + ?Sized,
{
    let ticket = sequencer.begin();
    let key = query.cache_key();
    if let Some(hit) = cache.get::<Vec<T>>(&key) {
        debug!(key = %key, size = hit.len(), "Cache hit");
        return Ok(Some((hit, FetchOrigin::Cache)));
    }

    let fetched = fetcher.fetch(query).await?;
    if !sequencer.is_current(ticket) {
        debug!(key = %key, ticket = ticket.value(), "Discarding stale response");
        return Ok(None);
    }
    store(cache, &key, &fetched, ttl);
    Ok(Some((fetched, FetchOrigin::Remote)))
}

fn store<T: Serialize>(cache: &CacheLayer, key: &str, fetched: &Vec<T>, ttl: Duration) {
    if let Err(e) = cache.set(key, fetched, ttl) {
        warn!(key = %key, error = %e, "Failed to cache fetch result");
    }
    debug!(key = %key, size = fetched.len(), "Fetched from source");
}
