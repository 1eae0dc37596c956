//! Admission applications.

use serde::Deserialize;

use crate::db::Predicate;
use crate::query::{FilterBuilder, RecordFilter};

pub const ADMISSION_SEARCH_FIELDS: &[&str] = &["name", "fatherName", "motherName", "phone"];

/// Query criteria for listing admissions.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionFilter {
    #[serde(default, alias = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter for AdmissionFilter {
    fn predicate(&self) -> Predicate {
        FilterBuilder::new()
            .exact("className", self.class_name.as_deref())
            .exact("status", self.status.as_deref())
            .search(self.search.as_deref(), ADMISSION_SEARCH_FIELDS)
            .build()
    }
}

/// Request body for changing an application's status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub status: Option<String>,
}
