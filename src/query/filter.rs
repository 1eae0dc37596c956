//! Translation of optional list criteria into a store predicate.

use crate::db::Predicate;

/// Accumulates optional criteria into one conjunctive [`Predicate`].
///
/// Absent or blank criteria add no constraint, so any subset of criteria (including none)
/// yields a valid predicate.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    clauses: Vec<Predicate>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact string match on `field` when `value` is present.
    pub fn exact(mut self, field: &str, value: Option<&str>) -> Self {
        if let Some(value) = present(value) {
            self.clauses.push(Predicate::eq(field, value));
        }
        self
    }

    /// Case-insensitive substring match of `term` against any of `fields`.
    pub fn search(mut self, term: Option<&str>, fields: &[&str]) -> Self {
        if let Some(term) = present(term) {
            if !fields.is_empty() {
                self.clauses.push(Predicate::Or(
                    fields
                        .iter()
                        .map(|f| Predicate::Contains(f.to_string(), term.to_string()))
                        .collect(),
                ));
            }
        }
        self
    }

    pub fn build(self) -> Predicate {
        Predicate::all_of(self.clauses)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Criteria that compile to a store predicate.
pub trait RecordFilter {
    fn predicate(&self) -> Predicate;
}
