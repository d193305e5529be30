//! # Curriculum API Handlers
//!
//! School years, semesters (including the current-semester toggle), class
//! times, courses and their sections. Reads are open to any authenticated
//! user; writes require an administrator.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, not_found};
use crate::handlers::check_reference;
use crate::handlers::types::{ApiJson, ApiPath, ApiQuery, PageParams, PaginatedResponse, nullable};
use crate::models::{classroom, classtime, course, department, school_year, section, semester};
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{
    ClasstimeRepository, CourseFilter, CourseRepository, SchoolYearRepository, SectionRepository,
    SemesterRepository,
};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/years", get(list_years).post(create_year))
        .route("/years/{year}", get(get_year).delete(delete_year))
        .route("/semesters", get(list_semesters).post(create_semester))
        .route("/semesters/current", get(current_semester))
        .route(
            "/semesters/{id}",
            get(get_semester).patch(update_semester).delete(delete_semester),
        )
        .route("/classtimes", get(list_classtimes).post(create_classtime))
        .route(
            "/classtimes/{id}",
            get(get_classtime)
                .patch(update_classtime)
                .delete(delete_classtime),
        )
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{id}/sections", get(list_sections).post(create_section))
        .route(
            "/courses/{id}/sections/{section_id}",
            get(get_section).patch(update_section).delete(delete_section),
        )
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::AdminOrReadOnly,
            enforce,
        ))
}

// School years

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SchoolYearPayload {
    #[schema(example = 2024)]
    pub year: i32,
}

impl From<school_year::Model> for SchoolYearPayload {
    fn from(model: school_year::Model) -> Self {
        Self { year: model.year }
    }
}

/// List school years, newest first
#[utoipa::path(
    get,
    path = "/api/v1/years",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "School years", body = [SchoolYearPayload]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn list_years(State(state): State<AppState>) -> Result<Json<Vec<SchoolYearPayload>>, ApiError> {
    let years = SchoolYearRepository::new(&state.db).list().await?;
    Ok(Json(years.into_iter().map(SchoolYearPayload::from).collect()))
}

/// Create a school year
#[utoipa::path(
    post,
    path = "/api/v1/years",
    security(("bearer_auth" = [])),
    request_body = SchoolYearPayload,
    responses(
        (status = 201, description = "School year created", body = SchoolYearPayload),
        (status = 400, description = "Year is not four digits", body = ApiError),
        (status = 409, description = "Year already exists", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn create_year(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SchoolYearPayload>,
) -> Result<(StatusCode, Json<SchoolYearPayload>), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("year", validators::school_year(request.year));
    errors.into_result()?;

    let year = SchoolYearRepository::new(&state.db).create(request.year).await?;
    Ok((StatusCode::CREATED, Json(year.into())))
}

/// Get a school year
#[utoipa::path(
    get,
    path = "/api/v1/years/{year}",
    security(("bearer_auth" = [])),
    params(("year" = i32, Path, description = "Four-digit year")),
    responses(
        (status = 200, description = "School year", body = SchoolYearPayload),
        (status = 404, description = "School year not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn get_year(
    State(state): State<AppState>,
    ApiPath(year): ApiPath<i32>,
) -> Result<Json<SchoolYearPayload>, ApiError> {
    Ok(Json(SchoolYearRepository::new(&state.db).get(year).await?.into()))
}

/// Delete a school year
#[utoipa::path(
    delete,
    path = "/api/v1/years/{year}",
    security(("bearer_auth" = [])),
    params(("year" = i32, Path, description = "Four-digit year")),
    responses(
        (status = 204, description = "School year deleted"),
        (status = 404, description = "School year not found", body = ApiError),
        (status = 409, description = "School year still referenced", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn delete_year(
    State(state): State<AppState>,
    ApiPath(year): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    SchoolYearRepository::new(&state.db).delete(year).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Semesters

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSemesterRequest {
    #[schema(example = "first")]
    pub term: String,
    #[schema(example = 2024)]
    pub school_year: i32,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSemesterRequest {
    pub term: Option<String>,
    pub school_year: Option<i32>,
    /// Setting `true` clears the flag on every other semester
    pub is_current: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SemesterResponse {
    pub id: i32,
    pub term: String,
    pub school_year: i32,
    pub is_current: bool,
}

impl From<semester::Model> for SemesterResponse {
    fn from(model: semester::Model) -> Self {
        Self {
            id: model.id,
            term: model.term,
            school_year: model.school_year,
            is_current: model.is_current,
        }
    }
}

/// List semesters
#[utoipa::path(
    get,
    path = "/api/v1/semesters",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Semesters", body = [SemesterResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn list_semesters(
    State(state): State<AppState>,
) -> Result<Json<Vec<SemesterResponse>>, ApiError> {
    let semesters = SemesterRepository::new(&state.db).list().await?;
    Ok(Json(semesters.into_iter().map(SemesterResponse::from).collect()))
}

/// Create a semester
#[utoipa::path(
    post,
    path = "/api/v1/semesters",
    security(("bearer_auth" = [])),
    request_body = CreateSemesterRequest,
    responses(
        (status = 201, description = "Semester created", body = SemesterResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Term already exists for the school year", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn create_semester(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSemesterRequest>,
) -> Result<(StatusCode, Json<SemesterResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("term", validators::term(&request.term));
    check_reference::<school_year::Entity, _>(
        &state.db,
        &mut errors,
        "school_year",
        Some(request.school_year),
    )
    .await?;
    errors.into_result()?;

    let semester = SemesterRepository::new(&state.db)
        .save(semester::ActiveModel {
            term: Set(request.term),
            school_year: Set(request.school_year),
            is_current: Set(request.is_current),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(semester.into())))
}

/// The semester marked current
#[utoipa::path(
    get,
    path = "/api/v1/semesters/current",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current semester", body = SemesterResponse),
        (status = 404, description = "No semester is current", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn current_semester(
    State(state): State<AppState>,
) -> Result<Json<SemesterResponse>, ApiError> {
    let semester = SemesterRepository::new(&state.db)
        .current()
        .await?
        .ok_or_else(|| not_found("NOT_FOUND", "No semester is marked current"))?;
    Ok(Json(semester.into()))
}

/// Get a semester
#[utoipa::path(
    get,
    path = "/api/v1/semesters/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Semester id")),
    responses(
        (status = 200, description = "Semester", body = SemesterResponse),
        (status = 404, description = "Semester not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn get_semester(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<SemesterResponse>, ApiError> {
    Ok(Json(SemesterRepository::new(&state.db).get(id).await?.into()))
}

/// Update a semester
#[utoipa::path(
    patch,
    path = "/api/v1/semesters/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Semester id")),
    request_body = UpdateSemesterRequest,
    responses(
        (status = 200, description = "Semester updated", body = SemesterResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Semester not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn update_semester(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateSemesterRequest>,
) -> Result<Json<SemesterResponse>, ApiError> {
    let repo = SemesterRepository::new(&state.db);
    let mut semester = repo.get(id).await?.into_active_model();

    let mut errors = FieldErrors::new();
    if let Some(term) = &request.term {
        errors.check("term", validators::term(term));
    }
    check_reference::<school_year::Entity, _>(&state.db, &mut errors, "school_year", request.school_year)
        .await?;
    errors.into_result()?;

    if let Some(term) = request.term {
        semester.term = Set(term);
    }
    if let Some(school_year) = request.school_year {
        semester.school_year = Set(school_year);
    }
    if let Some(is_current) = request.is_current {
        semester.is_current = Set(is_current);
    }
    Ok(Json(repo.save(semester).await?.into()))
}

/// Delete a semester
#[utoipa::path(
    delete,
    path = "/api/v1/semesters/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Semester id")),
    responses(
        (status = 204, description = "Semester deleted"),
        (status = 404, description = "Semester not found", body = ApiError),
        (status = 409, description = "Semester still referenced", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn delete_semester(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    SemesterRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Class times

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateClasstimeRequest {
    #[schema(example = "08:00AM")]
    pub start_time: String,
    #[schema(example = "09:30AM")]
    pub end_time: String,
    #[schema(example = "MWF")]
    pub week_days: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateClasstimeRequest {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub week_days: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClasstimeResponse {
    pub id: i32,
    pub start_time: String,
    pub end_time: String,
    pub week_days: String,
}

impl From<classtime::Model> for ClasstimeResponse {
    fn from(model: classtime::Model) -> Self {
        Self {
            id: model.id,
            start_time: model.start_time,
            end_time: model.end_time,
            week_days: model.week_days,
        }
    }
}

fn validate_classtime(start_time: &str, end_time: &str, week_days: &str) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check("start_time", validators::clock_time(start_time).map(|_| ()))
        .check("end_time", validators::clock_time(end_time).map(|_| ()))
        .check("week_days", validators::week_days(week_days));
    if errors.is_empty() {
        errors.check("end_time", validators::class_time_range(start_time, end_time));
    }
    errors.into_result()
}

/// List class times
#[utoipa::path(
    get,
    path = "/api/v1/classtimes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Class times", body = [ClasstimeResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn list_classtimes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClasstimeResponse>>, ApiError> {
    let classtimes = ClasstimeRepository::new(&state.db).list().await?;
    Ok(Json(classtimes.into_iter().map(ClasstimeResponse::from).collect()))
}

/// Create a class time
#[utoipa::path(
    post,
    path = "/api/v1/classtimes",
    security(("bearer_auth" = [])),
    request_body = CreateClasstimeRequest,
    responses(
        (status = 201, description = "Class time created", body = ClasstimeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Class time already exists", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn create_classtime(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateClasstimeRequest>,
) -> Result<(StatusCode, Json<ClasstimeResponse>), ApiError> {
    validate_classtime(&request.start_time, &request.end_time, &request.week_days)?;
    let classtime = ClasstimeRepository::new(&state.db)
        .save(classtime::ActiveModel {
            start_time: Set(request.start_time),
            end_time: Set(request.end_time),
            week_days: Set(request.week_days),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(classtime.into())))
}

/// Get a class time
#[utoipa::path(
    get,
    path = "/api/v1/classtimes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Class time id")),
    responses(
        (status = 200, description = "Class time", body = ClasstimeResponse),
        (status = 404, description = "Class time not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn get_classtime(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ClasstimeResponse>, ApiError> {
    Ok(Json(ClasstimeRepository::new(&state.db).get(id).await?.into()))
}

/// Update a class time
#[utoipa::path(
    patch,
    path = "/api/v1/classtimes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Class time id")),
    request_body = UpdateClasstimeRequest,
    responses(
        (status = 200, description = "Class time updated", body = ClasstimeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Class time not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn update_classtime(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateClasstimeRequest>,
) -> Result<Json<ClasstimeResponse>, ApiError> {
    let repo = ClasstimeRepository::new(&state.db);
    let current = repo.get(id).await?;

    let start_time = request.start_time.unwrap_or_else(|| current.start_time.clone());
    let end_time = request.end_time.unwrap_or_else(|| current.end_time.clone());
    let week_days = request.week_days.unwrap_or_else(|| current.week_days.clone());
    validate_classtime(&start_time, &end_time, &week_days)?;

    let mut classtime = current.into_active_model();
    classtime.start_time = Set(start_time);
    classtime.end_time = Set(end_time);
    classtime.week_days = Set(week_days);
    Ok(Json(repo.save(classtime).await?.into()))
}

/// Delete a class time
#[utoipa::path(
    delete,
    path = "/api/v1/classtimes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Class time id")),
    responses(
        (status = 204, description = "Class time deleted"),
        (status = 404, description = "Class time not found", body = ApiError),
        (status = 409, description = "Class time has sections", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn delete_classtime(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    ClasstimeRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Courses

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    pub department_id: Option<i32>,
    /// Only courses whose prerequisite is this course id
    pub prerequisite: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    #[schema(example = "CS101")]
    pub code: String,
    #[schema(example = "Introduction to Programming")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = 3)]
    pub units: i32,
    pub department_id: i32,
    pub prerequisite_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub units: Option<i32>,
    pub department_id: Option<i32>,
    /// `null` removes the prerequisite
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub prerequisite_id: Option<Option<i32>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub description: String,
    pub units: i32,
    pub department_id: i32,
    pub prerequisite_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            title: model.title,
            description: model.description,
            units: model.units,
            department_id: model.department_id,
            prerequisite_id: model.prerequisite_id,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// List courses
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    security(("bearer_auth" = [])),
    params(CourseListQuery, PageParams),
    responses(
        (status = 200, description = "Page of courses", body = PaginatedResponse<CourseResponse>),
        (status = 400, description = "Invalid query", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CourseListQuery>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<CourseResponse>>, ApiError> {
    let page = CourseRepository::new(&state.db)
        .list(
            CourseFilter {
                department_id: filter.department_id,
                prerequisite_id: filter.prerequisite,
            },
            page.resolve()?,
        )
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, CourseResponse::from)))
}

/// Create a course
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    security(("bearer_auth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Course code taken", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn create_course(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check("code", validators::required(&request.code, 20))
        .check("title", validators::required(&request.title, 200))
        .check("units", validators::in_range(request.units, 1, 6));
    check_reference::<department::Entity, _>(
        &state.db,
        &mut errors,
        "department_id",
        Some(request.department_id),
    )
    .await?;
    errors.into_result()?;

    let course = CourseRepository::new(&state.db)
        .save(course::ActiveModel {
            code: Set(request.code.trim().to_string()),
            title: Set(request.title.trim().to_string()),
            description: Set(request.description),
            units: Set(request.units),
            department_id: Set(request.department_id),
            prerequisite_id: Set(request.prerequisite_id),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

/// Get a course
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 404, description = "Course not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CourseResponse>, ApiError> {
    Ok(Json(CourseRepository::new(&state.db).get(id).await?.into()))
}

/// Update a course
#[utoipa::path(
    patch,
    path = "/api/v1/courses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Course not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn update_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let repo = CourseRepository::new(&state.db);
    let mut course = repo.get(id).await?.into_active_model();

    let mut errors = FieldErrors::new();
    if let Some(code) = &request.code {
        errors.check("code", validators::required(code, 20));
    }
    if let Some(title) = &request.title {
        errors.check("title", validators::required(title, 200));
    }
    if let Some(units) = request.units {
        errors.check("units", validators::in_range(units, 1, 6));
    }
    check_reference::<department::Entity, _>(&state.db, &mut errors, "department_id", request.department_id)
        .await?;
    errors.into_result()?;

    if let Some(code) = request.code {
        course.code = Set(code.trim().to_string());
    }
    if let Some(title) = request.title {
        course.title = Set(title.trim().to_string());
    }
    if let Some(description) = request.description {
        course.description = Set(description);
    }
    if let Some(units) = request.units {
        course.units = Set(units);
    }
    if let Some(department_id) = request.department_id {
        course.department_id = Set(department_id);
    }
    if let Some(prerequisite_id) = request.prerequisite_id {
        course.prerequisite_id = Set(prerequisite_id);
    }
    Ok(Json(repo.save(course).await?.into()))
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found", body = ApiError),
        (status = 409, description = "Course still referenced", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    CourseRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Sections

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSectionRequest {
    #[schema(example = "A")]
    pub name: String,
    pub classroom_id: i32,
    pub classtime_id: i32,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSectionRequest {
    pub name: Option<String>,
    pub classroom_id: Option<i32>,
    pub classtime_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SectionResponse {
    pub id: i32,
    pub name: String,
    pub course_id: i32,
    pub classroom_id: i32,
    pub classtime_id: i32,
}

impl From<section::Model> for SectionResponse {
    fn from(model: section::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            course_id: model.course_id,
            classroom_id: model.classroom_id,
            classtime_id: model.classtime_id,
        }
    }
}

/// List a course's sections
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/sections",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Course id")),
    responses(
        (status = 200, description = "Sections", body = [SectionResponse]),
        (status = 404, description = "Course not found", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn list_sections(
    State(state): State<AppState>,
    ApiPath(course_id): ApiPath<i32>,
) -> Result<Json<Vec<SectionResponse>>, ApiError> {
    let sections = SectionRepository::new(&state.db)
        .list_for_course(course_id)
        .await?;
    Ok(Json(sections.into_iter().map(SectionResponse::from).collect()))
}

/// Add a section to a course
#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/sections",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Course id")),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Course not found", body = ApiError),
        (status = 409, description = "Room and time already booked, or name taken", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn create_section(
    State(state): State<AppState>,
    ApiPath(course_id): ApiPath<i32>,
    ApiJson(request): ApiJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<SectionResponse>), ApiError> {
    CourseRepository::new(&state.db).get(course_id).await?;

    let mut errors = FieldErrors::new();
    errors.check("name", validators::section_name(&request.name));
    check_reference::<classroom::Entity, _>(
        &state.db,
        &mut errors,
        "classroom_id",
        Some(request.classroom_id),
    )
    .await?;
    check_reference::<classtime::Entity, _>(
        &state.db,
        &mut errors,
        "classtime_id",
        Some(request.classtime_id),
    )
    .await?;
    errors.into_result()?;

    let section = SectionRepository::new(&state.db)
        .save(section::ActiveModel {
            name: Set(request.name.trim().to_string()),
            course_id: Set(course_id),
            classroom_id: Set(request.classroom_id),
            classtime_id: Set(request.classtime_id),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(section.into())))
}

/// Get a section
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/sections/{section_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course id"),
        ("section_id" = i32, Path, description = "Section id")
    ),
    responses(
        (status = 200, description = "Section", body = SectionResponse),
        (status = 404, description = "Section not found in course", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn get_section(
    State(state): State<AppState>,
    ApiPath((course_id, section_id)): ApiPath<(i32, i32)>,
) -> Result<Json<SectionResponse>, ApiError> {
    let section = SectionRepository::new(&state.db)
        .get_in_course(course_id, section_id)
        .await?;
    Ok(Json(section.into()))
}

/// Update a section
#[utoipa::path(
    patch,
    path = "/api/v1/courses/{id}/sections/{section_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course id"),
        ("section_id" = i32, Path, description = "Section id")
    ),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Section updated", body = SectionResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Section not found in course", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn update_section(
    State(state): State<AppState>,
    ApiPath((course_id, section_id)): ApiPath<(i32, i32)>,
    ApiJson(request): ApiJson<UpdateSectionRequest>,
) -> Result<Json<SectionResponse>, ApiError> {
    let repo = SectionRepository::new(&state.db);
    let mut section = repo
        .get_in_course(course_id, section_id)
        .await?
        .into_active_model();

    let mut errors = FieldErrors::new();
    if let Some(name) = &request.name {
        errors.check("name", validators::section_name(name));
    }
    check_reference::<classroom::Entity, _>(&state.db, &mut errors, "classroom_id", request.classroom_id)
        .await?;
    check_reference::<classtime::Entity, _>(&state.db, &mut errors, "classtime_id", request.classtime_id)
        .await?;
    errors.into_result()?;

    if let Some(name) = request.name {
        section.name = Set(name.trim().to_string());
    }
    if let Some(classroom_id) = request.classroom_id {
        section.classroom_id = Set(classroom_id);
    }
    if let Some(classtime_id) = request.classtime_id {
        section.classtime_id = Set(classtime_id);
    }
    Ok(Json(repo.save(section).await?.into()))
}

/// Delete a section
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/sections/{section_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course id"),
        ("section_id" = i32, Path, description = "Section id")
    ),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 404, description = "Section not found in course", body = ApiError),
        (status = 409, description = "Section still referenced", body = ApiError)
    ),
    tag = "curriculum"
)]
pub async fn delete_section(
    State(state): State<AppState>,
    ApiPath((course_id, section_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let repo = SectionRepository::new(&state.db);
    repo.get_in_course(course_id, section_id).await?;
    repo.delete(section_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
