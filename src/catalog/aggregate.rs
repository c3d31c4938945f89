//! Course → resource type → items grouping.

use super::collation::{compare, fold_case};
use crate::model::Resource;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// All admitted resources of one course
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGroup {
    /// Course code as first seen
    pub code: String,
    pub name: Option<String>,
    pub department: Option<String>,
    /// Type bucket -> resources in admitted order
    pub by_type: BTreeMap<String, Vec<Resource>>,
    pub total_count: usize,
}

impl CourseGroup {
    fn seeded_from(resource: &Resource) -> Self {
        Self {
            code: resource.course_code.clone(),
            name: resource.course_name.clone(),
            department: resource.department.clone(),
            by_type: BTreeMap::new(),
            total_count: 0,
        }
    }

    pub fn type_count(&self, resource_type: &str) -> usize {
        self.by_type.get(resource_type).map(Vec::len).unwrap_or(0)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }
}

/// Group admitted resources by course code (case-insensitive), sorted by code
pub fn group_courses<'r, I>(admitted: I) -> Vec<CourseGroup>
where
    I: IntoIterator<Item = &'r Resource>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<CourseGroup> = Vec::new();

    for resource in admitted {
        let key = fold_case(resource.course_code.trim());
        let position = *positions.entry(key).or_insert_with(|| {
            groups.push(CourseGroup::seeded_from(resource));
            groups.len() - 1
        });
        let group = &mut groups[position];
        group
            .by_type
            .entry(resource.resource_type.clone())
            .or_default()
            .push(resource.clone());
        group.total_count += 1;
    }

    groups.sort_by(|a, b| compare(&a.code, &b.code));
    groups
}
