//! Exam marks.

use serde::Deserialize;

use crate::db::Predicate;
use crate::query::{FilterBuilder, RecordFilter};

/// Query criteria for listing marks.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksFilter {
    #[serde(default)]
    pub exam_type: Option<String>,
    #[serde(default, alias = "class")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "super::de::string_or_number")]
    pub roll: Option<String>,
    #[serde(default, deserialize_with = "super::de::string_or_number")]
    pub exam_year: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl RecordFilter for MarksFilter {
    fn predicate(&self) -> Predicate {
        FilterBuilder::new()
            .exact("examType", self.exam_type.as_deref())
            .exact("className", self.class_name.as_deref())
            .exact("roll", self.roll.as_deref())
            .exact("examYear", self.exam_year.as_deref())
            .exact("subject", self.subject.as_deref())
            .build()
    }
}
