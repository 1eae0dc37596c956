//! Document model shared by the store and the query layer.
//!
//! Records are free-form JSON objects; the store only reasons about the fields named in
//! predicates, sort keys and group keys.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;

/// A stored record.
pub type Document = Map<String, Value>;

/// Field carrying the store-generated identifier on returned documents.
pub const ID_FIELD: &str = "_id";

/// Creation timestamp stamped on insert.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Modification timestamp stamped on every update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Filter over the documents of one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document.
    All,
    /// Field equals the value (type-sensitive, `"12"` does not equal `12`).
    Eq(String, Value),
    /// Field differs from the value; a missing field counts as different.
    Ne(String, Value),
    /// Case-insensitive substring match on the textual form of the field.
    Contains(String, String),
    /// Identifier is one of the given ids.
    IdIn(Vec<String>),
    /// Identifier differs from the given id.
    IdNe(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ne(field.into(), value.into())
    }

    /// Conjunction that collapses trivial cases.
    pub fn all_of(clauses: Vec<Predicate>) -> Self {
        let mut clauses: Vec<Predicate> = clauses
            .into_iter()
            .filter(|p| *p != Predicate::All)
            .collect();
        match clauses.len() {
            0 => Predicate::All,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses),
        }
    }

    /// Conjunction of `self` and `other`.
    pub fn and(self, other: Predicate) -> Self {
        Predicate::all_of(vec![self, other])
    }
}

/// Sort direction, serialized as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// One (field, direction) pair of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Conditional counter evaluated per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    /// Name of the counter in the group result.
    pub name: String,
    pub field: String,
    pub value: Value,
}

/// Grouping request understood by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub predicate: Predicate,
    pub keys: Vec<String>,
    pub accumulators: Vec<Accumulator>,
}

/// One group produced by [`GroupSpec`], ordered ascending by its keys.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Group key values, one per [`GroupSpec::keys`] entry; missing fields are `Null`.
    pub keys: Vec<Value>,
    pub count: i64,
    /// Conditional counts, in [`GroupSpec::accumulators`] order.
    pub sums: Vec<(String, i64)>,
}

impl GroupRow {
    pub fn sum(&self, name: &str) -> i64 {
        self.sums
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }
}

/// Validate a record identifier.
pub fn parse_id(raw: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::Validation(format!("Invalid identifier: {}", raw)))
}

/// Identifier of a stored record, as returned by the store.
pub fn record_id(record: &Document) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// Generate a fresh record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Check that a field name is safe to embed in a store path expression.
pub fn validate_field(field: &str) -> Result<(), AppError> {
    let valid = !field.is_empty()
        && !field.starts_with('.')
        && !field.ends_with('.')
        && !field.contains("..")
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid field name: {:?}", field)))
    }
}
