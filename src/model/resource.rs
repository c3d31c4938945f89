//! Catalog resources: flat course material records.

use crate::sync::query::Queryable;
use crate::types::{ResourceId, TimestampMs};
use serde::{Deserialize, Serialize};

/// Moderation status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Approved,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Approved => "approved",
        }
    }
}

/// Course resource record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    /// Grouping key, compared case-insensitively
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub resource_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    /// Free-text period label, e.g. "2023 Güz"
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub instructor: Option<String>,
    pub status: ResourceStatus,
    #[serde(default)]
    pub created_at: Option<TimestampMs>,
}

impl Resource {
    /// Approved resource with the minimum set of fields filled in
    pub fn new(
        id: impl Into<String>,
        course_code: impl Into<String>,
        resource_type: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            course_code: course_code.into(),
            course_name: None,
            department: None,
            resource_type: resource_type.into(),
            title: String::new(),
            url: String::new(),
            mime_type: String::new(),
            size: 0,
            term: term.into(),
            instructor: None,
            status: ResourceStatus::Approved,
            created_at: None,
        }
    }

    pub fn with_course_name(mut self, name: impl Into<String>) -> Self {
        self.course_name = Some(name.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_approved(&self) -> bool {
        self.status == ResourceStatus::Approved
    }
}

impl Queryable for Resource {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "courseCode" => Some(self.course_code.clone()),
            "resourceType" => Some(self.resource_type.clone()),
            "term" => Some(self.term.clone()),
            "department" => self.department.clone(),
            _ => None,
        }
    }

    fn created_at(&self) -> Option<TimestampMs> {
        self.created_at
    }
}
