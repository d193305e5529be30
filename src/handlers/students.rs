//! # Student API Handlers
//!
//! Student profiles and uploads, enrollments, course eligibility and the
//! student-scoped views of grades and attendance. Reads are open to any
//! authenticated user; writes require an administrator or registrar.

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::handlers::attendance::AttendanceResponse;
use crate::handlers::curriculum::CourseResponse;
use crate::handlers::grades::GradeResponse;
use crate::handlers::types::{ApiJson, ApiPath, ApiQuery, PageParams, PaginatedResponse};
use crate::handlers::uploads::{FileUploadForm, store_media};
use crate::handlers::{AddressResponse, check_address, check_person, check_reference};
use crate::media::MediaKind;
use crate::models::{enrollment, major, school_year, section, student, user};
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{
    AddressInput, AttendanceRepository, EnrollmentRepository, GradeRepository, StudentRepository,
};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

const STUDENT_NUMBER_MAX_LEN: usize = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
        .route("/students/{id}/image", post(upload_student_image))
        .route("/students/{id}/tor", post(upload_student_tor))
        .route(
            "/students/{id}/enrollments",
            get(list_enrollments).post(create_enrollment),
        )
        .route(
            "/students/{id}/enrollments/{enrollment_id}",
            delete(delete_enrollment),
        )
        .route("/students/{id}/eligible-courses", get(eligible_courses))
        .route("/students/{id}/grades", get(list_student_grades))
        .route("/students/{id}/attendances", get(list_student_attendances))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::RegistrarOrReadOnly,
            enforce,
        ))
}

// Profiles

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    pub major_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    pub user_id: i32,
    #[schema(example = "2024-00123")]
    pub student_number: String,
    pub major_id: i32,
    #[schema(example = 1)]
    pub year_level: i32,
    #[serde(default)]
    pub is_transfer_student: bool,
    #[schema(example = 2024)]
    pub admission_year: i32,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateStudentRequest {
    pub student_number: Option<String>,
    pub major_id: Option<i32>,
    pub year_level: Option<i32>,
    pub is_transfer_student: Option<bool>,
    pub admission_year: Option<i32>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub user_id: i32,
    pub student_number: String,
    pub major_id: i32,
    pub year_level: i32,
    pub is_transfer_student: bool,
    pub admission_year: i32,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub image: Option<String>,
    /// Stored transcript of records
    pub tor: Option<String>,
    pub address: Option<AddressResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl StudentResponse {
    fn new(model: student::Model, address: Option<AddressResponse>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            student_number: model.student_number,
            major_id: model.major_id,
            year_level: model.year_level,
            is_transfer_student: model.is_transfer_student,
            admission_year: model.admission_year,
            phone: model.phone,
            birth_date: model.birth_date,
            gender: model.gender,
            image: model.image,
            tor: model.tor,
            address,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

async fn student_response(
    repo: &StudentRepository<'_>,
    model: student::Model,
) -> Result<StudentResponse, ApiError> {
    let address = repo.address(&model).await?.map(AddressResponse::from);
    Ok(StudentResponse::new(model, address))
}

/// List students
#[utoipa::path(
    get,
    path = "/api/v1/students",
    security(("bearer_auth" = [])),
    params(StudentListQuery, PageParams),
    responses(
        (status = 200, description = "Page of students", body = PaginatedResponse<StudentResponse>),
        (status = 400, description = "Invalid query", body = ApiError)
    ),
    tag = "students"
)]
pub async fn list_students(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StudentListQuery>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<StudentResponse>>, ApiError> {
    let repo = StudentRepository::new(&state.db);
    let page = repo.list(filter.major_id, page.resolve()?).await?;

    let mut data = Vec::with_capacity(page.items.len());
    for student in page.items {
        data.push(student_response(&repo, student).await?);
    }
    let next_cursor = page.next_after.map(crate::cursor::encode_cursor);
    Ok(Json(PaginatedResponse::new(data, next_cursor)))
}

/// Create a student profile
#[utoipa::path(
    post,
    path = "/api/v1/students",
    security(("bearer_auth" = [])),
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Student number or user already taken", body = ApiError)
    ),
    tag = "students"
)]
pub async fn create_student(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check(
            "student_number",
            validators::required(&request.student_number, STUDENT_NUMBER_MAX_LEN),
        )
        .check("year_level", validators::in_range(request.year_level, 1, 6));
    check_person(
        &mut errors,
        Some(&request.phone),
        Some(&request.gender),
        Some(request.birth_date),
    );
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<user::Entity, _>(&state.db, &mut errors, "user_id", Some(request.user_id)).await?;
    check_reference::<major::Entity, _>(&state.db, &mut errors, "major_id", Some(request.major_id)).await?;
    check_reference::<school_year::Entity, _>(
        &state.db,
        &mut errors,
        "admission_year",
        Some(request.admission_year),
    )
    .await?;
    errors.into_result()?;

    let repo = StudentRepository::new(&state.db);
    let student = repo
        .save(
            student::ActiveModel {
                user_id: Set(request.user_id),
                student_number: Set(request.student_number.trim().to_string()),
                major_id: Set(request.major_id),
                year_level: Set(request.year_level),
                is_transfer_student: Set(request.is_transfer_student),
                admission_year: Set(request.admission_year),
                phone: Set(request.phone),
                birth_date: Set(request.birth_date),
                gender: Set(request.gender),
                ..Default::default()
            },
            None,
            request.address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(student_response(&repo, student).await?)))
}

/// Get a student profile
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 200, description = "Student", body = StudentResponse),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn get_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StudentResponse>, ApiError> {
    let repo = StudentRepository::new(&state.db);
    let student = repo.get(id).await?;
    Ok(Json(student_response(&repo, student).await?))
}

/// Update a student profile
#[utoipa::path(
    patch,
    path = "/api/v1/students/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn update_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, ApiError> {
    let repo = StudentRepository::new(&state.db);
    let current = repo.get(id).await?;

    let mut errors = FieldErrors::new();
    if let Some(student_number) = &request.student_number {
        errors.check(
            "student_number",
            validators::required(student_number, STUDENT_NUMBER_MAX_LEN),
        );
    }
    if let Some(year_level) = request.year_level {
        errors.check("year_level", validators::in_range(year_level, 1, 6));
    }
    check_person(
        &mut errors,
        request.phone.as_deref(),
        request.gender.as_deref(),
        request.birth_date,
    );
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<major::Entity, _>(&state.db, &mut errors, "major_id", request.major_id).await?;
    check_reference::<school_year::Entity, _>(
        &state.db,
        &mut errors,
        "admission_year",
        request.admission_year,
    )
    .await?;
    errors.into_result()?;

    let existing_address = current.address_id;
    let mut student = current.into_active_model();
    if let Some(student_number) = request.student_number {
        student.student_number = Set(student_number.trim().to_string());
    }
    if let Some(major_id) = request.major_id {
        student.major_id = Set(major_id);
    }
    if let Some(year_level) = request.year_level {
        student.year_level = Set(year_level);
    }
    if let Some(is_transfer_student) = request.is_transfer_student {
        student.is_transfer_student = Set(is_transfer_student);
    }
    if let Some(admission_year) = request.admission_year {
        student.admission_year = Set(admission_year);
    }
    if let Some(phone) = request.phone {
        student.phone = Set(phone);
    }
    if let Some(birth_date) = request.birth_date {
        student.birth_date = Set(birth_date);
    }
    if let Some(gender) = request.gender {
        student.gender = Set(gender);
    }

    let student = repo.save(student, existing_address, request.address).await?;
    Ok(Json(student_response(&repo, student).await?))
}

/// Delete a student profile and its address
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found", body = ApiError),
        (status = 409, description = "Student has enrollments or grades", body = ApiError)
    ),
    tag = "students"
)]
pub async fn delete_student(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    StudentRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn store_student_file(
    state: &AppState,
    id: i32,
    multipart: &mut Multipart,
    kind: MediaKind,
) -> Result<StudentResponse, ApiError> {
    let repo = StudentRepository::new(&state.db);
    let student = repo.get(id).await?;
    let path = store_media(&state.media, multipart, kind, student.user_id).await?;

    let mut active = student.into_active_model();
    match kind {
        MediaKind::Image => active.image = Set(Some(path)),
        MediaKind::Transcript => active.tor = Set(Some(path)),
    }
    let student = repo.save(active, None, None).await?;
    student_response(&repo, student).await
}

/// Upload a student's profile image
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/image",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = StudentResponse),
        (status = 400, description = "Missing file or unsupported type", body = ApiError),
        (status = 404, description = "Student not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError)
    ),
    tag = "students"
)]
pub async fn upload_student_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<StudentResponse>, ApiError> {
    Ok(Json(
        store_student_file(&state, id, &mut multipart, MediaKind::Image).await?,
    ))
}

/// Upload a student's transcript of records
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/tor",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Transcript stored", body = StudentResponse),
        (status = 400, description = "Missing file or unsupported type", body = ApiError),
        (status = 404, description = "Student not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError)
    ),
    tag = "students"
)]
pub async fn upload_student_tor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<StudentResponse>, ApiError> {
    Ok(Json(
        store_student_file(&state, id, &mut multipart, MediaKind::Transcript).await?,
    ))
}

// Enrollments

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEnrollmentRequest {
    pub section_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub section_id: i32,
    pub semester_id: i32,
    pub school_year: i32,
    pub created_at: String,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(model: enrollment::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            course_id: model.course_id,
            section_id: model.section_id,
            semester_id: model.semester_id,
            school_year: model.school_year,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EligibleCoursesQuery {
    pub department_id: Option<i32>,
}

/// List a student's enrollments
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/enrollments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id"), PageParams),
    responses(
        (status = 200, description = "Page of enrollments", body = PaginatedResponse<EnrollmentResponse>),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<EnrollmentResponse>>, ApiError> {
    let page = EnrollmentRepository::new(&state.db, state.config.passing_grade)
        .list_for_student(student_id, page.resolve()?)
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, EnrollmentResponse::from)))
}

/// Enroll a student in a section for the current semester
#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/enrollments",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id")),
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Student enrolled", body = EnrollmentResponse),
        (status = 400, description = "No current semester or course not eligible", body = ApiError),
        (status = 404, description = "Student not found", body = ApiError),
        (status = 409, description = "Already enrolled this semester", body = ApiError)
    ),
    tag = "students"
)]
pub async fn create_enrollment(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
    ApiJson(request): ApiJson<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    StudentRepository::new(&state.db).get(student_id).await?;

    let mut errors = FieldErrors::new();
    check_reference::<section::Entity, _>(&state.db, &mut errors, "section_id", Some(request.section_id))
        .await?;
    errors.into_result()?;

    let enrollment = EnrollmentRepository::new(&state.db, state.config.passing_grade)
        .enroll(student_id, request.section_id)
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

/// Drop an enrollment
#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}/enrollments/{enrollment_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Student id"),
        ("enrollment_id" = i32, Path, description = "Enrollment id")
    ),
    responses(
        (status = 204, description = "Enrollment deleted"),
        (status = 404, description = "Enrollment not found for this student", body = ApiError)
    ),
    tag = "students"
)]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    ApiPath((student_id, enrollment_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    EnrollmentRepository::new(&state.db, state.config.passing_grade)
        .delete(student_id, enrollment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Courses the student may enroll in
///
/// Excludes courses the student is enrolled in this semester, courses they
/// already passed and courses whose prerequisite they have not passed.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/eligible-courses",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id"), EligibleCoursesQuery),
    responses(
        (status = 200, description = "Eligible courses ordered by code", body = [CourseResponse]),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn eligible_courses(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<EligibleCoursesQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = EnrollmentRepository::new(&state.db, state.config.passing_grade)
        .eligible_courses(student_id, query.department_id)
        .await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

// Records

/// List a student's grades
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/grades",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id"), PageParams),
    responses(
        (status = 200, description = "Page of grades", body = PaginatedResponse<GradeResponse>),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn list_student_grades(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<GradeResponse>>, ApiError> {
    let passing_grade = state.config.passing_grade;
    let page = GradeRepository::new(&state.db)
        .list_for_student(student_id, page.resolve()?)
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, |grade| {
        GradeResponse::new(grade, passing_grade)
    })))
}

/// List a student's attendance
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/attendances",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Student id"), PageParams),
    responses(
        (status = 200, description = "Page of attendance rows", body = PaginatedResponse<AttendanceResponse>),
        (status = 404, description = "Student not found", body = ApiError)
    ),
    tag = "students"
)]
pub async fn list_student_attendances(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i32>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<AttendanceResponse>>, ApiError> {
    let page = AttendanceRepository::new(&state.db)
        .list_for_student(student_id, page.resolve()?)
        .await?;
    Ok(Json(PaginatedResponse::from_page(page, AttendanceResponse::from)))
}
