//! Per-category navigation cursor.
//!
//! The cursor is a stack of breadcrumbs. Depth 0 (a single crumb naming the category)
//! is the initial state; `descend` pushes, `ascend` and `jump_to` truncate. The current
//! path is always the path of the last crumb.

use crate::error::ApiError;
use crate::model::Document;
use crate::tree::TreeStore;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// One step of the trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: DocumentId,
}

/// Navigation position within one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCursor {
    category_id: DocumentId,
    breadcrumb: Vec<Breadcrumb>,
}

impl NavigationCursor {
    pub fn new(category_id: impl Into<String>, label: impl Into<String>) -> Self {
        let category_id = category_id.into();
        Self {
            breadcrumb: vec![Breadcrumb {
                label: label.into(),
                path: category_id.clone(),
            }],
            category_id,
        }
    }

    pub fn for_category(category: &Document) -> Self {
        Self::new(category.id.clone(), category.title.clone())
    }

    /// Rebuild a cursor positioned at `folder_id` from the tree's parent links
    pub fn restore(tree: &TreeStore, category_id: &str, folder_id: &str) -> Result<Self, ApiError> {
        let chain = tree.ancestors(folder_id)?;
        let broken = || ApiError::BrokenAncestry {
            id: folder_id.to_string(),
            category: category_id.to_string(),
        };

        let (top, rest) = chain.split_first().ok_or_else(broken)?;
        if top.id != category_id {
            return Err(broken());
        }

        let mut cursor = Self::for_category(top);
        for doc in rest {
            cursor.descend(doc)?;
        }
        Ok(cursor)
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn current_path(&self) -> &str {
        // The trail is never empty
        self.breadcrumb
            .last()
            .map(|crumb| crumb.path.as_str())
            .unwrap_or(self.category_id.as_str())
    }

    pub fn breadcrumb(&self) -> &[Breadcrumb] {
        &self.breadcrumb
    }

    /// Number of folders entered below the category
    pub fn depth(&self) -> usize {
        self.breadcrumb.len() - 1
    }

    pub fn is_at_root(&self) -> bool {
        self.breadcrumb.len() == 1
    }

    /// Enter `folder`, which must sit directly under the current path
    pub fn descend(&mut self, folder: &Document) -> Result<(), ApiError> {
        if !folder.is_folder() {
            return Err(ApiError::NotAFolder {
                id: folder.id.clone(),
                kind: folder.kind.name(),
            });
        }
        if folder.parent_path != self.current_path() {
            return Err(ApiError::NotInCurrentFolder {
                id: folder.id.clone(),
                path: self.current_path().to_string(),
            });
        }
        self.breadcrumb.push(Breadcrumb {
            label: folder.title.clone(),
            path: folder.id.clone(),
        });
        Ok(())
    }

    /// Truncate the trail so `index` is the last crumb
    pub fn jump_to(&mut self, index: usize) -> Result<(), ApiError> {
        if index >= self.breadcrumb.len() {
            return Err(ApiError::BreadcrumbOutOfRange {
                index,
                len: self.breadcrumb.len(),
            });
        }
        self.breadcrumb.truncate(index + 1);
        Ok(())
    }

    /// Go up one level; no-op at the category root
    pub fn ascend(&mut self) {
        if self.breadcrumb.len() > 1 {
            self.breadcrumb.pop();
        }
    }
}
