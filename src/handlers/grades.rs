//! # Grade API Handlers
//!
//! Grade sheets for a teaching assignment. Any authenticated user may read
//! them; uploads need an administrator or the teacher who owns the
//! assignment.

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthUser, CurrentUser};
use crate::error::{ApiError, forbidden, not_found};
use crate::grading::{check_upload, parse_grade_rows, read_first_worksheet};
use crate::handlers::types::ApiPath;
use crate::handlers::uploads::{FILE_FIELD, FileUploadForm, read_file_field};
use crate::models::grade;
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{GradeRepository, TeachRepository, TeacherRepository};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/teachers/{id}/teaches/{teach_id}/grades",
            get(list_teach_grades).post(upload_grades),
        )
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::TeacherOrReadOnly,
            enforce,
        ))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GradeResponse {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub section_id: i32,
    pub semester_id: i32,
    pub school_year: i32,
    pub teacher_id: i32,
    pub quiz: f64,
    pub assignment: f64,
    pub attendance: f64,
    pub project: f64,
    pub midterm_exam: f64,
    pub final_exam: f64,
    /// Mean of the six component scores
    pub average: f64,
    /// Whether the average reaches the configured passing grade
    pub passed: bool,
    pub created_at: String,
}

impl GradeResponse {
    pub fn new(model: grade::Model, passing_grade: f64) -> Self {
        let average = model.average();
        Self {
            id: model.id,
            student_id: model.student_id,
            course_id: model.course_id,
            section_id: model.section_id,
            semester_id: model.semester_id,
            school_year: model.school_year,
            teacher_id: model.teacher_id,
            quiz: model.quiz,
            assignment: model.assignment,
            attendance: model.attendance,
            project: model.project,
            midterm_exam: model.midterm_exam,
            final_exam: model.final_exam,
            average,
            passed: average >= passing_grade,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Admins may upload for anyone; teachers only for their own profile.
async fn ensure_uploader(
    state: &AppState,
    user: &CurrentUser,
    teacher_id: i32,
) -> Result<(), ApiError> {
    if user.is_admin() {
        return Ok(());
    }
    let own = TeacherRepository::new(&state.db)
        .find_by_user(user.id)
        .await?
        .is_some_and(|teacher| teacher.id == teacher_id);
    if !own {
        return Err(forbidden(Some("You may only upload grades for your own classes")));
    }
    Ok(())
}

/// List the grades recorded for a teaching assignment
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/teaches/{teach_id}/grades",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Teacher id"),
        ("teach_id" = i32, Path, description = "Teach id")
    ),
    responses(
        (status = 200, description = "Grades ordered by student", body = [GradeResponse]),
        (status = 404, description = "Teach not found for this teacher", body = ApiError)
    ),
    tag = "grades"
)]
pub async fn list_teach_grades(
    State(state): State<AppState>,
    ApiPath((teacher_id, teach_id)): ApiPath<(i32, i32)>,
) -> Result<Json<Vec<GradeResponse>>, ApiError> {
    let teach = TeachRepository::new(&state.db)
        .find_for_teacher(teacher_id, teach_id)
        .await?
        .ok_or_else(|| not_found("TEACH_NOT_FOUND", &format!("Teach {} not found", teach_id)))?;

    let passing_grade = state.config.passing_grade;
    let grades = GradeRepository::new(&state.db).list_for_teach(&teach).await?;
    Ok(Json(
        grades
            .into_iter()
            .map(|grade| GradeResponse::new(grade, passing_grade))
            .collect(),
    ))
}

/// Upload a grade sheet for a teaching assignment
///
/// The sheet is a single `.xlsx` worksheet: five header rows, then one row
/// per enrolled student with the student id followed by the quiz,
/// assignment, attendance, project, midterm exam and final exam scores.
/// Every row is written or none are.
#[utoipa::path(
    post,
    path = "/api/v1/teachers/{id}/teaches/{teach_id}/grades",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Teacher id"),
        ("teach_id" = i32, Path, description = "Teach id")
    ),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Grades created", body = [GradeResponse]),
        (status = 400, description = "Bad file, invalid sheet or roster mismatch", body = ApiError),
        (status = 403, description = "Not the owning teacher", body = ApiError),
        (status = 404, description = "Teacher, teach, section or student not found", body = ApiError),
        (status = 409, description = "Grades already uploaded", body = ApiError),
        (status = 413, description = "File too large", body = ApiError),
        (status = 500, description = "Workbook could not be opened", body = ApiError)
    ),
    tag = "grades"
)]
pub async fn upload_grades(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath((teacher_id, teach_id)): ApiPath<(i32, i32)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<GradeResponse>>), ApiError> {
    ensure_uploader(&state, &user, teacher_id).await?;
    let repo = GradeRepository::new(&state.db);
    let (teach, _section) = repo.upload_target(teacher_id, teach_id).await?;

    let limit = state.config.max_upload_bytes;
    let upload = read_file_field(&mut multipart, FILE_FIELD, limit).await?;
    let (file_name, bytes) = match upload {
        Some(upload) => (upload.file_name, upload.bytes),
        None => (None, Vec::new()),
    };
    check_upload(file_name.as_deref(), bytes.len(), limit)?;

    let grid = read_first_worksheet(&bytes)?;
    let rows = parse_grade_rows(&grid)?;
    let grades = repo.import(&teach, rows).await?;

    let passing_grade = state.config.passing_grade;
    Ok((
        StatusCode::CREATED,
        Json(
            grades
                .into_iter()
                .map(|grade| GradeResponse::new(grade, passing_grade))
                .collect(),
        ),
    ))
}
