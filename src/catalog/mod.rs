//! Resource catalog: the approved resource list and its derived views.

pub mod aggregate;
pub mod collation;
pub mod filter;

pub use aggregate::{group_courses, CourseGroup};
pub use filter::{
    FilterConfig, FilterPipeline, NothingSaved, ResourcePredicate, SavedSet, Selection,
};

use crate::model::Resource;
use crate::types::ALL;
use std::collections::BTreeSet;
use tracing::debug;

/// Distinct non-blank terms, newest label first, behind an `ALL` entry
pub fn available_terms(resources: &[Resource]) -> Vec<String> {
    let distinct: BTreeSet<&str> = resources
        .iter()
        .map(|r| r.term.as_str())
        .filter(|term| !term.trim().is_empty())
        .collect();
    std::iter::once(ALL.to_string())
        .chain(distinct.into_iter().rev().map(str::to_string))
        .collect()
}

/// Latest approved resource list plus the terms derived from it
#[derive(Debug, Default, Clone)]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
    terms: Vec<String>,
    live: bool,
    loaded: bool,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self {
            terms: available_terms(&[]),
            ..Default::default()
        }
    }

    fn install(&mut self, resources: Vec<Resource>) {
        let total = resources.len();
        self.resources = resources.into_iter().filter(Resource::is_approved).collect();
        if self.resources.len() != total {
            debug!(
                dropped = total - self.resources.len(),
                "Ignoring resources that are not approved"
            );
        }
        self.terms = available_terms(&self.resources);
        self.loaded = true;
    }

    /// Replace the list with a live snapshot
    pub fn apply_snapshot(&mut self, resources: Vec<Resource>) {
        self.install(resources);
        self.live = true;
    }

    /// Seed the list from a one-shot fetch. Ignored once a live snapshot has landed.
    pub fn seed(&mut self, resources: Vec<Resource>) -> bool {
        if self.live {
            return false;
        }
        self.install(resources);
        true
    }

    /// Whether a live snapshot has been applied
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Whether any data (seeded or live) is present; distinguishes "no results" from "not loaded"
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn available_terms(&self) -> &[String] {
        &self.terms
    }

    pub fn admitted<'a>(&'a self, config: &FilterConfig, saved: &dyn SavedSet) -> Vec<&'a Resource> {
        FilterPipeline::from_config(config, saved).apply(&self.resources)
    }

    pub fn grouped_courses(&self, config: &FilterConfig, saved: &dyn SavedSet) -> Vec<CourseGroup> {
        group_courses(self.admitted(config, saved))
    }
}
