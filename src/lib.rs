//! Portal Archive: archive navigation and resource aggregation engine
//!
//! Mirrors a flat, parent-linked document collection as a browsable tree with
//! independent per-category cursors, and reduces a flat resource catalog into
//! course and type groups under a composable filter. Live snapshots arrive through
//! subscriptions; one-shot fetches are fronted by a TTL cache.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;

pub use engine::{ArchiveEngine, PrimeOutcome};
pub use error::{ApiError, StorageError};
