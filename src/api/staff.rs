//! Role-scoped staff listings.

use axum::extract::{Query, State};

use super::{success, ApiResult};
use crate::db::Document;
use crate::models::{StaffFilter, StaffRole, STAFF};
use crate::query::{ListParams, Page, RecordFilter};
use crate::AppState;

async fn list_role(
    state: &AppState,
    role: StaffRole,
    filter: &StaffFilter,
    params: &ListParams,
) -> ApiResult<Page<Document>> {
    let predicate = filter.predicate().and(role.predicate());
    let page = state.repo.list(&STAFF, predicate, params).await?;
    debug_assert!(page.items.iter().all(|record| StaffRole::of(record) == role));
    success(page)
}

/// GET /api/teachers - List staff who teach a subject.
pub async fn list_teachers(
    State(state): State<AppState>,
    Query(filter): Query<StaffFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    list_role(&state, StaffRole::Teacher, &filter, &params).await
}

/// GET /api/support-staff - List non-teaching staff.
pub async fn list_support_staff(
    State(state): State<AppState>,
    Query(filter): Query<StaffFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Document>> {
    list_role(&state, StaffRole::SupportStaff, &filter, &params).await
}
