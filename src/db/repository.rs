//! Entity operations over the document store.
//!
//! Each operation validates its input before any store access, then runs the write-path
//! rules for the entity.

use std::sync::Arc;

use serde_json::Value;

use super::document::{parse_id, Document, Predicate};
use super::store::{find_by_id, DocumentStore};
use crate::errors::AppError;
use crate::models::{
    Entity, MigrateStudentsRequest, MigrationOutcome, ALL_ENTITIES, ADMISSIONS, STUDENTS,
};
use crate::query::{ListParams, Page};
use crate::records::{migrate, ConflictGuard};

/// Repository for all record operations.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Install the unique index backing every natural key.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        for entity in ALL_ENTITIES.iter().filter(|e| e.is_keyed()) {
            self.store
                .ensure_unique_index(entity.collection, entity.natural_key)
                .await?;
            tracing::debug!(
                "Unique index on {}({})",
                entity.collection,
                entity.natural_key.join(", ")
            );
        }
        Ok(())
    }

    /// One page of the records matching `predicate`, with the unwindowed total.
    pub async fn list(
        &self,
        entity: &Entity,
        predicate: Predicate,
        params: &ListParams,
    ) -> Result<Page<Document>, AppError> {
        let query = params.normalize(entity.default_sort)?;

        let total = self.store.count(entity.collection, &predicate).await?;
        let items = self
            .store
            .find(
                entity.collection,
                &predicate,
                &query.sort,
                query.window.offset(),
                Some(query.window.limit),
            )
            .await?;

        Ok(Page::new(items, total, query.window))
    }

    pub async fn get(&self, entity: &Entity, id: &str) -> Result<Document, AppError> {
        let id = parse_id(id)?;
        find_by_id(self.store(), entity.collection, &id)
            .await?
            .ok_or_else(|| not_found(entity, &id))
    }

    pub async fn create(&self, entity: &Entity, record: Document) -> Result<Document, AppError> {
        ConflictGuard::new(self.store(), entity).insert(record).await
    }

    pub async fn update(
        &self,
        entity: &Entity,
        id: &str,
        update: Document,
    ) -> Result<Document, AppError> {
        let id = parse_id(id)?;
        ConflictGuard::new(self.store(), entity)
            .update(&id, update)
            .await
    }

    pub async fn delete(&self, entity: &Entity, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        let deleted = self.store.delete_one(entity.collection, &id).await?;
        if deleted == 0 {
            return Err(not_found(entity, &id));
        }
        tracing::debug!("{} {} deleted", entity.label, id);
        Ok(())
    }

    // ==================== STUDENT OPERATIONS ====================

    /// Move a set of students to a new class and academic year.
    pub async fn migrate_students(
        &self,
        request: &MigrateStudentsRequest,
    ) -> Result<MigrationOutcome, AppError> {
        let class_name = required(request.class_name.as_deref(), "className")?;
        let academic_year = required(request.academic_year.as_deref(), "academicYear")?;
        if request.student_ids.is_empty() {
            return Err(AppError::Validation(
                "studentIds must not be empty".to_string(),
            ));
        }
        let ids = request
            .student_ids
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fields = Document::new();
        fields.insert("className".to_string(), Value::String(class_name.clone()));
        fields.insert(
            "academicYear".to_string(),
            Value::String(academic_year.clone()),
        );

        let modified = migrate(self.store(), &STUDENTS, &ids, fields).await?;
        tracing::info!(
            "Migrated {} of {} students to class {} ({})",
            modified,
            ids.len(),
            class_name,
            academic_year
        );

        Ok(MigrationOutcome {
            requested: ids.len(),
            modified,
            class_name,
            academic_year,
        })
    }

    // ==================== ADMISSION OPERATIONS ====================

    pub async fn set_admission_status(
        &self,
        id: &str,
        status: Option<&str>,
    ) -> Result<Document, AppError> {
        let status = required(status, "status")?;
        let mut update = Document::new();
        update.insert("status".to_string(), Value::String(status));
        self.update(&ADMISSIONS, id, update).await
    }
}

fn required(value: Option<&str>, name: &str) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

fn not_found(entity: &Entity, id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", entity.label, id))
}
