//! Composable grouping queries shared by the statistics reports.

use serde_json::Value;

use crate::db::{Accumulator, DocumentStore, GroupRow, GroupSpec, Predicate};
use crate::errors::AppError;

/// Builder for a grouped count: pre-filter, group keys and conditional counters.
#[derive(Debug, Clone)]
pub struct GroupQuery {
    spec: GroupSpec,
}

impl GroupQuery {
    /// Group by one or more fields, in order of precedence.
    pub fn by(keys: &[&str]) -> Self {
        Self {
            spec: GroupSpec {
                predicate: Predicate::All,
                keys: keys.iter().map(|k| k.to_string()).collect(),
                accumulators: Vec::new(),
            },
        }
    }

    /// Restrict the grouped records; repeated calls conjoin.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.spec.predicate = self.spec.predicate.and(predicate);
        self
    }

    /// Count records per group whose `field` equals `value`.
    pub fn count_where(mut self, name: &str, field: &str, value: impl Into<Value>) -> Self {
        self.spec.accumulators.push(Accumulator {
            name: name.to_string(),
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn spec(&self) -> &GroupSpec {
        &self.spec
    }

    pub async fn run(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
    ) -> Result<Vec<GroupRow>, AppError> {
        store.aggregate_group(collection, self.spec()).await
    }
}
