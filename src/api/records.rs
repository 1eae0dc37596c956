//! CRUD endpoints shared by every record collection.
//!
//! Handlers are generic over a [`Collection`] marker, which supplies the entity descriptor
//! and the list filter type.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{success, ApiResponse, ApiResult};
use crate::db::Document;
use crate::models::Collection;
use crate::query::{ListParams, Page, RecordFilter};
use crate::AppState;

/// GET /api/{collection} - List records matching the query criteria.
pub async fn list_records<C: Collection>(
    State(state): State<AppState>,
    Query(filter): Query<C::Filter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    let page = state
        .repo
        .list(C::entity(), filter.predicate(), &params)
        .await?;
    success(page)
}

/// GET /api/{collection}/:id - Get a single record.
pub async fn get_record<C: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    success(state.repo.get(C::entity(), &id).await?)
}

/// POST /api/{collection} - Create a record.
pub async fn create_record<C: Collection>(
    State(state): State<AppState>,
    Json(record): Json<Document>,
) -> ApiResult<Document> {
    let record = state.repo.create(C::entity(), record).await?;
    Ok(ApiResponse::created(record))
}

/// PUT /api/{collection}/:id - Merge fields into a record.
pub async fn update_record<C: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<Document>,
) -> ApiResult<Document> {
    success(state.repo.update(C::entity(), &id, update).await?)
}

/// DELETE /api/{collection}/:id - Delete a record.
pub async fn delete_record<C: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete(C::entity(), &id).await?;
    success(())
}
