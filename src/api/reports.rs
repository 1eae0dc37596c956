//! Statistics report endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{Breakdown, GroupCount, Overview};
use crate::AppState;

/// GET /api/reports/teachers/subjects
pub async fn teachers_by_subject(State(state): State<AppState>) -> ApiResult<Vec<GroupCount>> {
    success(state.reports.teachers_by_subject().await?)
}

/// GET /api/reports/teachers/designations
pub async fn teachers_by_designation(
    State(state): State<AppState>,
) -> ApiResult<Vec<GroupCount>> {
    success(state.reports.teachers_by_designation().await?)
}

/// GET /api/reports/staff/designations
pub async fn support_staff_by_designation(
    State(state): State<AppState>,
) -> ApiResult<Vec<GroupCount>> {
    success(state.reports.support_staff_by_designation().await?)
}

/// GET /api/reports/students/classes
pub async fn students_by_class(State(state): State<AppState>) -> ApiResult<Vec<Breakdown>> {
    success(state.reports.students_by_class().await?)
}

/// GET /api/reports/students/religions
pub async fn students_by_religion(State(state): State<AppState>) -> ApiResult<Vec<GroupCount>> {
    success(state.reports.students_by_religion().await?)
}

/// GET /api/reports/students/genders
pub async fn students_by_gender(State(state): State<AppState>) -> ApiResult<Vec<GroupCount>> {
    success(state.reports.students_by_gender().await?)
}

/// GET /api/reports/students/class-religion
pub async fn students_by_class_and_religion(
    State(state): State<AppState>,
) -> ApiResult<Vec<Breakdown>> {
    success(state.reports.students_by_class_and_religion().await?)
}

/// GET /api/reports/students/class-section
pub async fn students_by_class_and_section(
    State(state): State<AppState>,
) -> ApiResult<Vec<Breakdown>> {
    success(state.reports.students_by_class_and_section().await?)
}

/// GET /api/reports/overview - Headline counts for the dashboard.
pub async fn overview(State(state): State<AppState>) -> ApiResult<Overview> {
    success(state.reports.overview().await?)
}
