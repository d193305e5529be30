//! # Attendance API Handlers

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::types::{ApiJson, ApiPath, ApiQuery, PageParams, PaginatedResponse};
use crate::models::attendance;
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{AttendanceRepository, NewAttendance};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

const COMMENT_MAX_LEN: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sections/{id}/attendances",
            get(list_section_attendances).post(record_attendances),
        )
        .route(
            "/attendances/{id}",
            patch(update_attendance).delete(delete_attendance),
        )
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::TeacherOrReadOnly,
            enforce,
        ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    pub student_id: i32,
    /// One of P (present), A (absent), E (excused), T (tardy)
    #[schema(example = "P")]
    pub mark: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAttendanceRequest {
    pub mark: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: i32,
    pub mark: String,
    pub comment: String,
    pub student_id: i32,
    pub course_id: i32,
    pub section_id: i32,
    pub semester_id: i32,
    pub school_year: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<attendance::Model> for AttendanceResponse {
    fn from(model: attendance::Model) -> Self {
        Self {
            id: model.id,
            mark: model.mark,
            comment: model.comment,
            student_id: model.student_id,
            course_id: model.course_id,
            section_id: model.section_id,
            semester_id: model.semester_id,
            school_year: model.school_year,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

fn check_comment(errors: &mut FieldErrors, field: &str, comment: &str) {
    if comment.chars().count() > COMMENT_MAX_LEN {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", COMMENT_MAX_LEN),
        );
    }
}

/// List attendance recorded for a section
#[utoipa::path(
    get,
    path = "/api/v1/sections/{id}/attendances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Section id"), PageParams),
    responses(
        (status = 200, description = "Page of attendance rows", body = PaginatedResponse<AttendanceResponse>),
        (status = 404, description = "Section not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn list_section_attendances(
    State(state): State<AppState>,
    ApiPath(section_id): ApiPath<i32>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<AttendanceResponse>>, ApiError> {
    let page = AttendanceRepository::new(&state.db)
        .list_for_section(section_id, page.resolve()?)
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, AttendanceResponse::from)))
}

/// Record attendance for a section in the current semester
#[utoipa::path(
    post,
    path = "/api/v1/sections/{id}/attendances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Section id")),
    request_body = [AttendanceEntry],
    responses(
        (status = 201, description = "Attendance recorded", body = [AttendanceResponse]),
        (status = 400, description = "Invalid marks, no current semester or student not enrolled", body = ApiError),
        (status = 404, description = "Section not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn record_attendances(
    State(state): State<AppState>,
    ApiPath(section_id): ApiPath<i32>,
    ApiJson(entries): ApiJson<Vec<AttendanceEntry>>,
) -> Result<(StatusCode, Json<Vec<AttendanceResponse>>), ApiError> {
    let mut errors = FieldErrors::new();
    if entries.is_empty() {
        errors.add("non_field_errors", "At least one attendance entry is required.");
    }
    for (index, entry) in entries.iter().enumerate() {
        errors.check(&format!("[{index}].mark"), validators::attendance_mark(&entry.mark));
        check_comment(&mut errors, &format!("[{index}].comment"), &entry.comment);
    }
    errors.into_result()?;

    let entries = entries
        .into_iter()
        .map(|entry| NewAttendance {
            student_id: entry.student_id,
            mark: entry.mark,
            comment: entry.comment,
        })
        .collect();
    let created = AttendanceRepository::new(&state.db)
        .record(section_id, entries)
        .await?;

    tracing::info!(section_id, count = created.len(), "Recorded attendance");
    Ok((
        StatusCode::CREATED,
        Json(created.into_iter().map(AttendanceResponse::from).collect()),
    ))
}

/// Correct an attendance row
#[utoipa::path(
    patch,
    path = "/api/v1/attendances/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Attendance id")),
    request_body = UpdateAttendanceRequest,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Attendance not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn update_attendance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(mark) = &request.mark {
        errors.check("mark", validators::attendance_mark(mark));
    }
    if let Some(comment) = &request.comment {
        check_comment(&mut errors, "comment", comment);
    }
    errors.into_result()?;

    let row = AttendanceRepository::new(&state.db)
        .update(id, request.mark, request.comment)
        .await?;
    Ok(Json(row.into()))
}

/// Delete an attendance row
#[utoipa::path(
    delete,
    path = "/api/v1/attendances/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Attendance id")),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 404, description = "Attendance not found", body = ApiError)
    ),
    tag = "attendance"
)]
pub async fn delete_attendance(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    AttendanceRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
