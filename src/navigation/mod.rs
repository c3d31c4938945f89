//! Navigation state for every open category.
//!
//! Cursors are independent: moving in one category never touches another.

pub mod cursor;

pub use cursor::{Breadcrumb, NavigationCursor};

use crate::error::ApiError;
use crate::model::Document;
use crate::types::DocumentId;
use std::collections::HashMap;
use tracing::debug;

/// Keyed map `category id -> cursor`
#[derive(Debug, Default, Clone)]
pub struct NavigationManager {
    cursors: HashMap<DocumentId, NavigationCursor>,
}

impl NavigationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cursor for `category`, creating it at the category root if needed
    pub fn open(&mut self, category: &Document) -> Result<&mut NavigationCursor, ApiError> {
        if !category.is_category() {
            return Err(ApiError::UnknownCategory(category.id.clone()));
        }
        Ok(self
            .cursors
            .entry(category.id.clone())
            .or_insert_with(|| {
                debug!(category = %category.id, "Opening navigation cursor");
                NavigationCursor::for_category(category)
            }))
    }

    /// Install a prebuilt cursor, e.g. one restored from a deep link
    pub fn insert(&mut self, cursor: NavigationCursor) {
        self.cursors.insert(cursor.category_id().to_string(), cursor);
    }

    pub fn cursor(&self, category_id: &str) -> Option<&NavigationCursor> {
        self.cursors.get(category_id)
    }

    pub fn cursor_mut(&mut self, category_id: &str) -> Result<&mut NavigationCursor, ApiError> {
        self.cursors
            .get_mut(category_id)
            .ok_or_else(|| ApiError::UnknownCategory(category_id.to_string()))
    }

    /// Return a category's cursor to its root
    pub fn reset(&mut self, category_id: &str) -> Result<(), ApiError> {
        self.cursor_mut(category_id)?.jump_to(0)
    }

    pub fn close(&mut self, category_id: &str) -> Option<NavigationCursor> {
        self.cursors.remove(category_id)
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.cursors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
