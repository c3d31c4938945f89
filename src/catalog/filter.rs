//! Filter pipeline over the approved resource list.
//!
//! Each active filter setting becomes one independent predicate. A resource is admitted
//! when every predicate admits it, so evaluation order never changes the result.

use super::collation::{contains_folded, fold_case};
use crate::model::Resource;
use crate::types::ALL;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A value selection where `ALL` means "no restriction"
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn only(value: impl Into<String>) -> Self {
        Selection::from(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => ALL.to_string(),
            Selection::Only(value) => value,
        }
    }
}

/// User-facing filter settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub saved_only: bool,
    pub search_text: String,
    pub resource_type: Selection,
    pub term: Selection,
}

impl FilterConfig {
    pub fn saved_only(mut self, saved_only: bool) -> Self {
        self.saved_only = saved_only;
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn resource_type(mut self, selection: Selection) -> Self {
        self.resource_type = selection;
        self
    }

    pub fn term(mut self, selection: Selection) -> Self {
        self.term = selection;
        self
    }
}

/// Membership test for the caller's saved resources
pub trait SavedSet {
    fn contains_id(&self, id: &str) -> bool;
}

impl SavedSet for HashSet<String> {
    fn contains_id(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl SavedSet for BTreeSet<String> {
    fn contains_id(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl SavedSet for Vec<String> {
    fn contains_id(&self, id: &str) -> bool {
        self.iter().any(|saved| saved == id)
    }
}

/// Saved set for callers without a profile
#[derive(Debug, Default, Clone, Copy)]
pub struct NothingSaved;

impl SavedSet for NothingSaved {
    fn contains_id(&self, _id: &str) -> bool {
        false
    }
}

/// Single admission rule
pub trait ResourcePredicate {
    fn name(&self) -> &'static str;
    fn admits(&self, resource: &Resource) -> bool;
}

pub struct SavedOnly<'a> {
    saved: &'a dyn SavedSet,
}

impl<'a> SavedOnly<'a> {
    pub fn new(saved: &'a dyn SavedSet) -> Self {
        Self { saved }
    }
}

impl ResourcePredicate for SavedOnly<'_> {
    fn name(&self) -> &'static str {
        "saved_only"
    }

    fn admits(&self, resource: &Resource) -> bool {
        self.saved.contains_id(&resource.id)
    }
}

/// Case-insensitive substring match on course code or course name
pub struct SearchText {
    needle: String,
}

impl SearchText {
    pub fn new(text: &str) -> Self {
        Self {
            needle: fold_case(text),
        }
    }
}

impl ResourcePredicate for SearchText {
    fn name(&self) -> &'static str {
        "search_text"
    }

    fn admits(&self, resource: &Resource) -> bool {
        contains_folded(&resource.course_code, &self.needle)
            || resource
                .course_name
                .as_deref()
                .map(|name| contains_folded(name, &self.needle))
                .unwrap_or(false)
    }
}

pub struct TypeIs(pub String);

impl ResourcePredicate for TypeIs {
    fn name(&self) -> &'static str {
        "resource_type"
    }

    fn admits(&self, resource: &Resource) -> bool {
        resource.resource_type == self.0
    }
}

pub struct TermIs(pub String);

impl ResourcePredicate for TermIs {
    fn name(&self) -> &'static str {
        "term"
    }

    fn admits(&self, resource: &Resource) -> bool {
        resource.term == self.0
    }
}

/// Conjunction of predicates
pub struct FilterPipeline<'a> {
    predicates: Vec<Box<dyn ResourcePredicate + 'a>>,
}

impl<'a> FilterPipeline<'a> {
    /// Build the pipeline for `config`; inactive settings contribute no predicate
    pub fn from_config(config: &FilterConfig, saved: &'a dyn SavedSet) -> Self {
        let mut predicates: Vec<Box<dyn ResourcePredicate + 'a>> = Vec::new();
        if config.saved_only {
            predicates.push(Box::new(SavedOnly::new(saved)));
        }
        if !config.search_text.is_empty() {
            predicates.push(Box::new(SearchText::new(&config.search_text)));
        }
        if let Selection::Only(kind) = &config.resource_type {
            predicates.push(Box::new(TypeIs(kind.clone())));
        }
        if let Selection::Only(term) = &config.term {
            predicates.push(Box::new(TermIs(term.clone())));
        }
        Self { predicates }
    }

    pub fn with_predicates(predicates: Vec<Box<dyn ResourcePredicate + 'a>>) -> Self {
        Self { predicates }
    }

    pub fn into_predicates(self) -> Vec<Box<dyn ResourcePredicate + 'a>> {
        self.predicates
    }

    /// Names of the active predicates, in evaluation order
    pub fn active(&self) -> Vec<&'static str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    pub fn admits(&self, resource: &Resource) -> bool {
        self.predicates.iter().all(|p| p.admits(resource))
    }

    /// Admitted resources in source order
    pub fn apply<'r>(&self, resources: &'r [Resource]) -> Vec<&'r Resource> {
        resources.iter().filter(|r| self.admits(r)).collect()
    }
}
