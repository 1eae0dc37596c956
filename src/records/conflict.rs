//! Natural-key duplicate checks on the write paths.
//!
//! The check is a read before the write. The store also carries a unique index per natural
//! key, which rejects whatever slips through between the two.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;

use super::merge::{merge_update, stamp_created, timestamp};
use crate::db::{
    find_by_id, record_id, Document, DocumentStore, Predicate, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::errors::AppError;
use crate::models::Entity;

/// Guards inserts and updates of one collection against natural-key collisions.
pub struct ConflictGuard<'a> {
    store: &'a dyn DocumentStore,
    entity: &'a Entity,
}

impl<'a> ConflictGuard<'a> {
    pub fn new(store: &'a dyn DocumentStore, entity: &'a Entity) -> Self {
        Self { store, entity }
    }

    /// Insert `record` unless another record already holds its natural key.
    ///
    /// Returns the stored record including its generated identifier.
    pub async fn insert(&self, mut record: Document) -> Result<Document, AppError> {
        self.entity.normalize(&mut record);

        if self.entity.is_keyed() {
            let key = self.key_of(&record, true)?;
            self.ensure_free(&key, None).await?;
        }

        stamp_created(&mut record, Utc::now());
        let id = self
            .store
            .insert_one(self.entity.collection, record.clone())
            .await?;
        tracing::debug!("{} {} created", self.entity.label, id);

        record.insert(ID_FIELD.to_string(), Value::String(id));
        Ok(record)
    }

    /// Merge `update` into the record with `id`.
    ///
    /// The duplicate check only runs when the update changes a natural-key field; the
    /// prospective key combines the new values with the unchanged existing ones.
    pub async fn update(&self, id: &str, mut update: Document) -> Result<Document, AppError> {
        let existing = find_by_id(self.store, self.entity.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;

        self.entity.normalize(&mut update);
        if update.remove(ID_FIELD).is_some() {
            tracing::debug!("Ignoring identifier in update of {} {}", self.entity.label, id);
        }

        let clears_key = self
            .entity
            .natural_key
            .iter()
            .any(|field| matches!(update.get(*field), Some(Value::Null)));
        if clears_key {
            // A key field may change but never be removed
            self.key_of(&update, true)?;
        }

        if self.changes_key(&existing, &update) {
            let mut prospective = Document::new();
            for field in self.entity.natural_key {
                let value = update
                    .get(*field)
                    .or_else(|| existing.get(*field))
                    .cloned()
                    .unwrap_or(Value::Null);
                prospective.insert(field.to_string(), value);
            }
            let key = self.key_of(&prospective, false)?;
            self.ensure_free(&key, Some(id)).await?;
        }

        let merged = merge_update(&existing, &update, Utc::now());
        let modified = self
            .store
            .update_one(self.entity.collection, id, &merged)
            .await?;
        if modified == 0 {
            // Deleted between the read and the write
            return Err(self.not_found(id));
        }

        let mut record = merged;
        record.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        Ok(record)
    }

    fn changes_key(&self, existing: &Document, update: &Document) -> bool {
        self.entity
            .natural_key
            .iter()
            .any(|field| match update.get(*field) {
                Some(new) => existing.get(*field) != Some(new),
                None => false,
            })
    }

    /// Extract the natural key. On insert every key field must be present.
    fn key_of(&self, record: &Document, require_all: bool) -> Result<Document, AppError> {
        let mut key = Document::new();
        for field in self.entity.natural_key {
            match record.get(*field) {
                Some(value) if !value.is_null() => {
                    key.insert(field.to_string(), value.clone());
                }
                _ if require_all => {
                    return Err(AppError::Validation(format!(
                        "{} requires {}",
                        self.entity.label,
                        self.entity.natural_key.join(", ")
                    )));
                }
                _ => {
                    key.insert(field.to_string(), Value::Null);
                }
            }
        }
        Ok(key)
    }

    async fn ensure_free(&self, key: &Document, exclude: Option<&str>) -> Result<(), AppError> {
        let mut clauses: Vec<Predicate> = key
            .iter()
            .map(|(field, value)| Predicate::Eq(field.clone(), value.clone()))
            .collect();
        if let Some(id) = exclude {
            clauses.push(Predicate::IdNe(id.to_string()));
        }

        let holder = self
            .store
            .find_one(self.entity.collection, &Predicate::all_of(clauses))
            .await?;
        match holder {
            None => Ok(()),
            Some(_) => {
                tracing::info!("{} key {:?} already taken", self.entity.label, key);
                Err(AppError::Duplicate {
                    message: format!("{} with the same key already exists", self.entity.label),
                    key: Value::Object(key.clone()),
                })
            }
        }
    }

    fn not_found(&self, id: &str) -> AppError {
        AppError::NotFound(format!("{} {} not found", self.entity.label, id))
    }
}

/// Set `fields` on every record in `ids`, or on none of them.
///
/// All identifiers are resolved first; if any is unknown the whole batch is refused with
/// the list of missing identifiers.
pub async fn migrate(
    store: &dyn DocumentStore,
    entity: &Entity,
    ids: &[String],
    mut fields: Document,
) -> Result<u64, AppError> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    let selection = Predicate::IdIn(ids.clone());

    let found = store
        .find(entity.collection, &selection, &[], 0, None)
        .await?;
    let found: HashSet<&str> = found
        .iter()
        .filter_map(record_id)
        .collect();
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingRecords {
            message: format!("{} {} of {} not found", missing.len(), entity.collection, ids.len()),
            ids: missing,
        });
    }

    entity.normalize(&mut fields);
    fields.remove(ID_FIELD);
    fields.insert(UPDATED_AT_FIELD.to_string(), timestamp(Utc::now()));

    let modified = store
        .update_many(entity.collection, &selection, &fields)
        .await?;
    tracing::info!("Migrated {} {}", modified, entity.collection);
    Ok(modified)
}
