//! School classes.

use serde::Deserialize;

use crate::db::Predicate;
use crate::query::{FilterBuilder, RecordFilter};

/// Query criteria for listing classes.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClassFilter {
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter for ClassFilter {
    fn predicate(&self) -> Predicate {
        FilterBuilder::new()
            .search(self.search.as_deref(), &["className"])
            .build()
    }
}
