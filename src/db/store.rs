//! Record store adapter.
//!
//! Every operation is scoped to a named collection. Implementations must be safe to share
//! across request handlers.

use async_trait::async_trait;

use super::document::{Document, GroupRow, GroupSpec, Predicate, SortKey};
use crate::errors::AppError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `predicate` in `sort` order, windowed by `skip`/`limit`.
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        sort: &[SortKey],
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>, AppError>;

    /// Number of documents matching `predicate`, independent of any window.
    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, AppError>;

    async fn find_one(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Option<Document>, AppError>;

    /// Insert a document and return its generated identifier.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<String, AppError>;

    /// Set `fields` on the document with `id`, returning the modified count.
    async fn update_one(&self, collection: &str, id: &str, fields: &Document)
        -> Result<u64, AppError>;

    /// Set `fields` on every document matching `predicate` as one batch.
    async fn update_many(
        &self,
        collection: &str,
        predicate: &Predicate,
        fields: &Document,
    ) -> Result<u64, AppError>;

    async fn delete_one(&self, collection: &str, id: &str) -> Result<u64, AppError>;

    /// Grouped counts, ordered ascending by the group keys.
    async fn aggregate_group(&self, collection: &str, spec: &GroupSpec)
        -> Result<Vec<GroupRow>, AppError>;

    /// Enforce uniqueness of the field combination within a collection.
    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> Result<(), AppError>;
}

/// Convenience lookup by identifier.
pub async fn find_by_id(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<Document>, AppError> {
    store
        .find_one(collection, &Predicate::IdIn(vec![id.to_string()]))
        .await
}
