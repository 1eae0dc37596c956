//! Student API endpoints beyond plain CRUD.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::{MigrateStudentsRequest, MigrationOutcome};
use crate::AppState;

/// POST /api/students/migrate - Move students to a new class and academic year.
///
/// Either every listed student is migrated or none is.
pub async fn migrate_students(
    State(state): State<AppState>,
    Json(request): Json<MigrateStudentsRequest>,
) -> ApiResult<MigrationOutcome> {
    success(state.repo.migrate_students(&request).await?)
}
