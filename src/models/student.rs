//! Student list criteria and bulk migration.

use serde::{Deserialize, Serialize};

use crate::db::Predicate;
use crate::query::{FilterBuilder, RecordFilter};

/// Status value of enrolled students; student reports count only these.
pub const STATUS_ACTIVE: &str = "active";

pub const GENDER_MALE: &str = "Male";
pub const GENDER_FEMALE: &str = "Female";

/// Fields matched by the free-text `search` criterion.
pub const STUDENT_SEARCH_FIELDS: &[&str] = &[
    "name",
    "roll",
    "fatherName",
    "motherName",
    "village",
    "subDistrict",
    "district",
];

/// Query criteria for listing students.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    #[serde(default, alias = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    /// Rolls compare as strings whatever form they arrive in.
    #[serde(default, deserialize_with = "super::de::string_or_number")]
    pub roll: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter for StudentFilter {
    fn predicate(&self) -> Predicate {
        FilterBuilder::new()
            .exact("className", self.class_name.as_deref())
            .exact("section", self.section.as_deref())
            .exact("roll", self.roll.as_deref())
            .exact("status", self.status.as_deref())
            .exact("gender", self.gender.as_deref())
            .exact("religion", self.religion.as_deref())
            .exact("bloodGroup", self.blood_group.as_deref())
            .search(self.search.as_deref(), STUDENT_SEARCH_FIELDS)
            .build()
    }
}

/// Request body for moving students to a new class and academic year.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateStudentsRequest {
    #[serde(default, alias = "ids")]
    pub student_ids: Vec<String>,
    #[serde(default, alias = "newClass")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "super::de::string_or_number")]
    pub academic_year: Option<String>,
}

/// Result of a completed migration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    pub requested: usize,
    pub modified: u64,
    pub class_name: String,
    pub academic_year: String,
}
