//! Query descriptors for live and one-shot reads against the remote store.
//!
//! The remote store understands equality filters and ordering by `createdAt`; that is
//! all a descriptor can express.

use crate::types::{TimestampMs, DOCUMENTS_COLLECTION, RESOURCES_COLLECTION};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Records that can be matched against a descriptor
pub trait Queryable {
    fn record_id(&self) -> &str;
    /// Field value by its wire name, if the record has it
    fn field(&self, name: &str) -> Option<String>;
    fn created_at(&self) -> Option<TimestampMs>;
}

/// Equality filter `field == value`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Descriptor of a query against one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl QueryDescriptor {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Documents directly under `parent`, oldest first
    pub fn documents_under(parent: &str) -> Self {
        Self::new(DOCUMENTS_COLLECTION)
            .where_eq("parentPath", parent)
            .order_by("createdAt", Direction::Ascending)
    }

    /// Documents cross-referenced to `tag`, oldest first
    pub fn documents_tagged(tag: &str) -> Self {
        Self::new(DOCUMENTS_COLLECTION)
            .where_eq("relatedTagId", tag)
            .order_by("createdAt", Direction::Ascending)
    }

    /// The approved slice of the resource catalog
    pub fn approved_resources() -> Self {
        Self::new(RESOURCES_COLLECTION).where_eq("status", "approved")
    }

    pub fn matches<T: Queryable>(&self, record: &T) -> bool {
        self.filters
            .iter()
            .all(|f| record.field(&f.field).as_deref() == Some(f.value.as_str()))
    }

    /// Evaluate the descriptor over an in-memory collection
    pub fn apply<T: Queryable + Clone>(&self, records: &[T]) -> Vec<T> {
        let mut result: Vec<T> = records.iter().filter(|r| self.matches(*r)).cloned().collect();
        if let Some(order) = &self.order_by {
            result.sort_by(|a, b| {
                let ord = compare_field(a, b, &order.field);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        result
    }

    /// Stable cache key, independent of filter insertion order
    pub fn cache_key(&self) -> String {
        let mut canonical = self.clone();
        canonical.filters.sort();
        // Serializing a plain struct of strings cannot fail
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        format!(
            "{}:{}",
            self.collection,
            hex::encode(&blake3::hash(&bytes).as_bytes()[..16])
        )
    }
}

fn compare_field<T: Queryable>(a: &T, b: &T, field: &str) -> Ordering {
    if field == "createdAt" {
        // Pending writes without a timestamp sort last
        match (a.created_at(), b.created_at()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    } else {
        a.field(field).cmp(&b.field(field))
    }
}
