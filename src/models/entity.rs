//! Record collections and the metadata the write paths need about them.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{AdmissionFilter, ClassFilter, MarksFilter, StaffFilter, StudentFilter};
use crate::db::Document;
use crate::query::RecordFilter;

/// Static description of one record collection.
#[derive(Debug)]
pub struct Entity {
    pub collection: &'static str,
    /// Singular name used in messages.
    pub label: &'static str,
    /// Fields that together identify a record; empty when the collection has no natural key.
    pub natural_key: &'static [&'static str],
    pub default_sort: &'static str,
    /// Fields stored as strings even when a client sends numbers.
    pub string_fields: &'static [&'static str],
}

impl Entity {
    pub fn is_keyed(&self) -> bool {
        !self.natural_key.is_empty()
    }

    /// Coerce numeric values of [`Entity::string_fields`] to strings.
    pub fn normalize(&self, document: &mut Document) {
        for field in self.string_fields {
            if let Some(value @ Value::Number(_)) = document.get(*field) {
                let text = value.to_string();
                document.insert(field.to_string(), Value::String(text));
            }
        }
    }
}

pub static STUDENTS: Entity = Entity {
    collection: "students",
    label: "Student",
    natural_key: &["roll", "className"],
    default_sort: "className,roll",
    string_fields: &["roll", "className"],
};

pub static ADMISSIONS: Entity = Entity {
    collection: "admissions",
    label: "Admission",
    natural_key: &[],
    default_sort: "-createdAt",
    string_fields: &[],
};

pub static STAFF: Entity = Entity {
    collection: "staff",
    label: "Staff member",
    natural_key: &["indexNumber"],
    default_sort: "name",
    string_fields: &["indexNumber"],
};

pub static MARKS: Entity = Entity {
    collection: "marks",
    label: "Marks entry",
    natural_key: &["examType", "className", "roll", "examYear"],
    default_sort: "className,roll",
    string_fields: &["roll", "examYear", "className"],
};

pub static CLASSES: Entity = Entity {
    collection: "classes",
    label: "Class",
    natural_key: &["className"],
    default_sort: "className",
    string_fields: &["className"],
};

/// Every collection, in the order indexes are installed.
pub static ALL_ENTITIES: [&Entity; 5] = [&STUDENTS, &ADMISSIONS, &STAFF, &MARKS, &CLASSES];

/// Binds a collection to its list filter, for the generic CRUD handlers.
pub trait Collection: Send + Sync + 'static {
    type Filter: RecordFilter + DeserializeOwned + Send + 'static;

    fn entity() -> &'static Entity;
}

pub struct Students;
pub struct Admissions;
pub struct StaffMembers;
pub struct Marks;
pub struct Classes;

impl Collection for Students {
    type Filter = StudentFilter;

    fn entity() -> &'static Entity {
        &STUDENTS
    }
}

impl Collection for Admissions {
    type Filter = AdmissionFilter;

    fn entity() -> &'static Entity {
        &ADMISSIONS
    }
}

impl Collection for StaffMembers {
    type Filter = StaffFilter;

    fn entity() -> &'static Entity {
        &STAFF
    }
}

impl Collection for Marks {
    type Filter = MarksFilter;

    fn entity() -> &'static Entity {
        &MARKS
    }
}

impl Collection for Classes {
    type Filter = ClassFilter;

    fn entity() -> &'static Entity {
        &CLASSES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_coerces_numbers_only() {
        let mut doc = json!({"roll": 12, "examYear": 2024, "className": 9, "total": 78})
            .as_object()
            .unwrap()
            .clone();
        MARKS.normalize(&mut doc);
        assert_eq!(doc["roll"], json!("12"));
        assert_eq!(doc["examYear"], json!("2024"));
        assert_eq!(doc["className"], json!("9"));
        // Not a string field for marks
        assert_eq!(doc["total"], json!(78));

        let mut doc = json!({"roll": "07", "className": 10})
            .as_object()
            .unwrap()
            .clone();
        STUDENTS.normalize(&mut doc);
        assert_eq!(doc["roll"], json!("07"));
        assert_eq!(doc["className"], json!("10"));

        let mut doc = json!({"className": 6}).as_object().unwrap().clone();
        CLASSES.normalize(&mut doc);
        assert_eq!(doc["className"], json!("6"));
    }

    #[test]
    fn test_keyed_collections() {
        assert!(STUDENTS.is_keyed());
        assert!(!ADMISSIONS.is_keyed());
        assert_eq!(ALL_ENTITIES.iter().filter(|e| e.is_keyed()).count(), 4);
    }
}
