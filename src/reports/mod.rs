//! Statistics reports over the record collections.
//!
//! Every report is a [`GroupQuery`] configuration; the store does the counting.

use std::sync::Arc;

use crate::db::{Document, DocumentStore, GroupRow, Predicate};
use crate::errors::AppError;
use crate::models::{
    Breakdown, GenderBreakdown, GroupCount, Overview, ReligionCounts, StaffRole, GENDER_FEMALE,
    GENDER_MALE, STAFF, STATUS_ACTIVE, STUDENTS,
};
use crate::query::GroupQuery;

const RELIGION_ISLAM: &str = "Islam";
const RELIGION_HINDUISM: &str = "Hinduism";

/// Runs the named statistics reports against a store.
#[derive(Clone)]
pub struct Reporter {
    store: Arc<dyn DocumentStore>,
}

impl Reporter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn teachers_by_subject(&self) -> Result<Vec<GroupCount>, AppError> {
        self.count_by(STAFF.collection, "subject", StaffRole::Teacher.predicate())
            .await
    }

    pub async fn teachers_by_designation(&self) -> Result<Vec<GroupCount>, AppError> {
        self.count_by(STAFF.collection, "designation", StaffRole::Teacher.predicate())
            .await
    }

    pub async fn support_staff_by_designation(&self) -> Result<Vec<GroupCount>, AppError> {
        self.count_by(
            STAFF.collection,
            "designation",
            StaffRole::SupportStaff.predicate(),
        )
        .await
    }

    pub async fn students_by_class(&self) -> Result<Vec<Breakdown>, AppError> {
        self.breakdown_by(STUDENTS.collection, &["className"], active_students())
            .await
    }

    pub async fn students_by_religion(&self) -> Result<Vec<GroupCount>, AppError> {
        self.count_by(STUDENTS.collection, "religion", active_students())
            .await
    }

    pub async fn students_by_gender(&self) -> Result<Vec<GroupCount>, AppError> {
        self.count_by(STUDENTS.collection, "gender", active_students())
            .await
    }

    pub async fn students_by_class_and_religion(&self) -> Result<Vec<Breakdown>, AppError> {
        self.breakdown_by(
            STUDENTS.collection,
            &["className", "religion"],
            active_students(),
        )
        .await
    }

    pub async fn students_by_class_and_section(&self) -> Result<Vec<Breakdown>, AppError> {
        self.breakdown_by(
            STUDENTS.collection,
            &["className", "section"],
            active_students(),
        )
        .await
    }

    /// Headline counts for staff roles and students.
    pub async fn overview(&self) -> Result<Overview, AppError> {
        let is_islam = Predicate::eq("religion", RELIGION_ISLAM);
        let is_hinduism = Predicate::eq("religion", RELIGION_HINDUISM);

        let (teachers, support_staff, students, islam, hinduism) = tokio::try_join!(
            self.gender_totals(STAFF.collection, StaffRole::Teacher.predicate()),
            self.gender_totals(STAFF.collection, StaffRole::SupportStaff.predicate()),
            self.gender_totals(STUDENTS.collection, Predicate::All),
            self.store.count(STUDENTS.collection, &is_islam),
            self.store.count(STUDENTS.collection, &is_hinduism),
        )?;

        Ok(Overview {
            teachers,
            support_staff,
            students,
            religion: ReligionCounts {
                islam: to_count(islam),
                hinduism: to_count(hinduism),
            },
        })
    }

    /// Records per distinct value of `field`, ascending by value.
    async fn count_by(
        &self,
        collection: &str,
        field: &str,
        filter: Predicate,
    ) -> Result<Vec<GroupCount>, AppError> {
        let rows = GroupQuery::by(&[field])
            .filter(filter)
            .run(self.store.as_ref(), collection)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| GroupCount {
                key: key_document(&[field], &row),
                count: row.count,
            })
            .collect())
    }

    /// Records per composite key with male/female sub-counts.
    async fn breakdown_by(
        &self,
        collection: &str,
        fields: &[&str],
        filter: Predicate,
    ) -> Result<Vec<Breakdown>, AppError> {
        let rows = with_genders(GroupQuery::by(fields).filter(filter))
            .run(self.store.as_ref(), collection)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Breakdown {
                key: key_document(fields, &row),
                counts: gender_breakdown(&row),
            })
            .collect())
    }

    async fn gender_totals(
        &self,
        collection: &str,
        filter: Predicate,
    ) -> Result<GenderBreakdown, AppError> {
        // No group keys: a single row over every matching record
        let rows = with_genders(GroupQuery::by(&[]).filter(filter))
            .run(self.store.as_ref(), collection)
            .await?;
        Ok(rows.first().map(gender_breakdown).unwrap_or_default())
    }
}

fn active_students() -> Predicate {
    Predicate::eq("status", STATUS_ACTIVE)
}

fn with_genders(query: GroupQuery) -> GroupQuery {
    query
        .count_where("male", "gender", GENDER_MALE)
        .count_where("female", "gender", GENDER_FEMALE)
}

fn gender_breakdown(row: &GroupRow) -> GenderBreakdown {
    GenderBreakdown {
        total: row.count,
        male: row.sum("male"),
        female: row.sum("female"),
    }
}

fn key_document(fields: &[&str], row: &GroupRow) -> Document {
    fields
        .iter()
        .zip(row.keys.iter())
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

fn to_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
