//! Staff records: teachers and support staff share one collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Document, Predicate};
use crate::query::{FilterBuilder, RecordFilter};

/// Subject value marking a staff member who does not teach.
const NO_SUBJECT: &str = "N/A";

/// Role of a staff member, derived from the `subject` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StaffRole {
    Teacher,
    SupportStaff,
}

impl StaffRole {
    /// Classify a stored staff record. A missing subject counts as teaching staff.
    pub fn of(record: &Document) -> Self {
        match record.get("subject") {
            Some(Value::String(subject)) if subject == NO_SUBJECT => StaffRole::SupportStaff,
            _ => StaffRole::Teacher,
        }
    }

    /// Store predicate selecting the records of this role.
    pub fn predicate(self) -> Predicate {
        match self {
            StaffRole::Teacher => Predicate::ne("subject", NO_SUBJECT),
            StaffRole::SupportStaff => Predicate::eq("subject", NO_SUBJECT),
        }
    }
}

pub const STAFF_SEARCH_FIELDS: &[&str] = &["name", "indexNumber", "designation", "subject", "phone"];

/// Query criteria for listing staff.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffFilter {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter for StaffFilter {
    fn predicate(&self) -> Predicate {
        FilterBuilder::new()
            .exact("subject", self.subject.as_deref())
            .exact("designation", self.designation.as_deref())
            .exact("gender", self.gender.as_deref())
            .search(self.search.as_deref(), STAFF_SEARCH_FIELDS)
            .build()
    }
}
