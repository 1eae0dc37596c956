//! Admission API endpoints beyond plain CRUD.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::db::Document;
use crate::models::StatusPatch;
use crate::AppState;

/// PATCH /api/admissions/:id/status - Change an application's status.
pub async fn update_admission_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<StatusPatch>,
) -> ApiResult<Document> {
    let admission = state
        .repo
        .set_admission_status(&id, patch.status.as_deref())
        .await?;
    tracing::info!("Admission {} set to {:?}", id, patch.status);
    success(admission)
}
