//! # Staff API Handlers
//!
//! Employee and teacher profiles, their profile images and the teaching
//! assignments ("teaches") linking a teacher to a section for a semester.
//! Reads are open to any authenticated user; writes require an
//! administrator.

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
};
use chrono::NaiveDate;
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, not_found};
use crate::handlers::types::{ApiJson, ApiPath, nullable};
use crate::handlers::uploads::{FileUploadForm, store_media};
use crate::handlers::{AddressResponse, check_address, check_person, check_reference};
use crate::media::MediaKind;
use crate::models::{department, employee, office, section, semester, teach, teacher, user};
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{AddressInput, EmployeeRepository, TeachRepository, TeacherRepository};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee)
                .patch(update_employee)
                .delete(delete_employee),
        )
        .route("/employees/{id}/image", post(upload_employee_image))
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route(
            "/teachers/{id}",
            get(get_teacher).patch(update_teacher).delete(delete_teacher),
        )
        .route("/teachers/{id}/image", post(upload_teacher_image))
        .route("/teachers/{id}/teaches", get(list_teaches).post(create_teach))
        .route(
            "/teachers/{id}/teaches/{teach_id}",
            get(get_teach).delete(delete_teach),
        )
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::AdminOrReadOnly,
            enforce,
        ))
}

fn check_hire_date(errors: &mut FieldErrors, birth_date: NaiveDate, hire_date: NaiveDate) {
    if hire_date <= birth_date {
        errors.add("hire_date", "Hire date must be after the birth date.");
    }
}

// Employees

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub user_id: i32,
    pub department_id: i32,
    pub office_id: Option<i32>,
    #[schema(example = "Accountant")]
    pub job_title: String,
    #[schema(example = "+639171234567")]
    pub phone: String,
    pub birth_date: NaiveDate,
    #[schema(example = "F")]
    pub gender: String,
    pub hire_date: NaiveDate,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub department_id: Option<i32>,
    /// `null` detaches the employee from their office
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub office_id: Option<Option<i32>>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub hire_date: Option<NaiveDate>,
    /// Replaces the stored address
    pub address: Option<AddressInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: i32,
    pub user_id: i32,
    pub department_id: i32,
    pub office_id: Option<i32>,
    pub job_title: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub hire_date: NaiveDate,
    pub image: Option<String>,
    pub address: Option<AddressResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl EmployeeResponse {
    fn new(model: employee::Model, address: Option<AddressResponse>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            department_id: model.department_id,
            office_id: model.office_id,
            job_title: model.job_title,
            phone: model.phone,
            birth_date: model.birth_date,
            gender: model.gender,
            hire_date: model.hire_date,
            image: model.image,
            address,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

async fn employee_response(
    repo: &EmployeeRepository<'_>,
    model: employee::Model,
) -> Result<EmployeeResponse, ApiError> {
    let address = repo.address(&model).await?.map(AddressResponse::from);
    Ok(EmployeeResponse::new(model, address))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Employees", body = [EmployeeResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeResponse>>, ApiError> {
    let repo = EmployeeRepository::new(&state.db);
    let mut responses = Vec::new();
    for employee in repo.list().await? {
        responses.push(employee_response(&repo, employee).await?);
    }
    Ok(Json(responses))
}

/// Create an employee profile
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    security(("bearer_auth" = [])),
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "User already has an employee profile", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("job_title", validators::required(&request.job_title, 100));
    check_person(
        &mut errors,
        Some(&request.phone),
        Some(&request.gender),
        Some(request.birth_date),
    );
    check_hire_date(&mut errors, request.birth_date, request.hire_date);
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<user::Entity, _>(&state.db, &mut errors, "user_id", Some(request.user_id)).await?;
    check_reference::<department::Entity, _>(
        &state.db,
        &mut errors,
        "department_id",
        Some(request.department_id),
    )
    .await?;
    check_reference::<office::Entity, _>(&state.db, &mut errors, "office_id", request.office_id).await?;
    errors.into_result()?;

    let repo = EmployeeRepository::new(&state.db);
    let employee = repo
        .save(
            employee::ActiveModel {
                user_id: Set(request.user_id),
                department_id: Set(request.department_id),
                office_id: Set(request.office_id),
                job_title: Set(request.job_title.trim().to_string()),
                phone: Set(request.phone),
                birth_date: Set(request.birth_date),
                gender: Set(request.gender),
                hire_date: Set(request.hire_date),
                ..Default::default()
            },
            None,
            request.address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(employee_response(&repo, employee).await?)))
}

/// Get an employee profile
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let repo = EmployeeRepository::new(&state.db);
    let employee = repo.get(id).await?;
    Ok(Json(employee_response(&repo, employee).await?))
}

/// Update an employee profile
#[utoipa::path(
    patch,
    path = "/api/v1/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateEmployeeRequest>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let repo = EmployeeRepository::new(&state.db);
    let current = repo.get(id).await?;

    let mut errors = FieldErrors::new();
    if let Some(job_title) = &request.job_title {
        errors.check("job_title", validators::required(job_title, 100));
    }
    check_person(
        &mut errors,
        request.phone.as_deref(),
        request.gender.as_deref(),
        request.birth_date,
    );
    check_hire_date(
        &mut errors,
        request.birth_date.unwrap_or(current.birth_date),
        request.hire_date.unwrap_or(current.hire_date),
    );
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<department::Entity, _>(&state.db, &mut errors, "department_id", request.department_id)
        .await?;
    check_reference::<office::Entity, _>(&state.db, &mut errors, "office_id", request.office_id.flatten())
        .await?;
    errors.into_result()?;

    let existing_address = current.address_id;
    let mut employee = current.into_active_model();
    if let Some(department_id) = request.department_id {
        employee.department_id = Set(department_id);
    }
    if let Some(office_id) = request.office_id {
        employee.office_id = Set(office_id);
    }
    if let Some(job_title) = request.job_title {
        employee.job_title = Set(job_title.trim().to_string());
    }
    if let Some(phone) = request.phone {
        employee.phone = Set(phone);
    }
    if let Some(birth_date) = request.birth_date {
        employee.birth_date = Set(birth_date);
    }
    if let Some(gender) = request.gender {
        employee.gender = Set(gender);
    }
    if let Some(hire_date) = request.hire_date {
        employee.hire_date = Set(hire_date);
    }

    let employee = repo.save(employee, existing_address, request.address).await?;
    Ok(Json(employee_response(&repo, employee).await?))
}

/// Delete an employee profile and its address
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    EmployeeRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an employee's profile image
#[utoipa::path(
    post,
    path = "/api/v1/employees/{id}/image",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Employee id")),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = EmployeeResponse),
        (status = 400, description = "Missing file or unsupported type", body = ApiError),
        (status = 404, description = "Employee not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn upload_employee_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<EmployeeResponse>, ApiError> {
    let repo = EmployeeRepository::new(&state.db);
    let employee = repo.get(id).await?;
    let path = store_media(&state.media, &mut multipart, MediaKind::Image, employee.user_id).await?;

    let mut active = employee.into_active_model();
    active.image = Set(Some(path));
    let employee = repo.save(active, None, None).await?;
    Ok(Json(employee_response(&repo, employee).await?))
}

// Teachers

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeacherRequest {
    pub user_id: i32,
    pub department_id: i32,
    #[schema(example = "Mathematics")]
    pub specialization: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub hire_date: NaiveDate,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTeacherRequest {
    pub department_id: Option<i32>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub address: Option<AddressInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeacherResponse {
    pub id: i32,
    pub user_id: i32,
    pub department_id: i32,
    pub specialization: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub hire_date: NaiveDate,
    pub image: Option<String>,
    pub address: Option<AddressResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl TeacherResponse {
    fn new(model: teacher::Model, address: Option<AddressResponse>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            department_id: model.department_id,
            specialization: model.specialization,
            phone: model.phone,
            birth_date: model.birth_date,
            gender: model.gender,
            hire_date: model.hire_date,
            image: model.image,
            address,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

async fn teacher_response(
    repo: &TeacherRepository<'_>,
    model: teacher::Model,
) -> Result<TeacherResponse, ApiError> {
    let address = repo.address(&model).await?.map(AddressResponse::from);
    Ok(TeacherResponse::new(model, address))
}

/// List teachers
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Teachers", body = [TeacherResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn list_teachers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherResponse>>, ApiError> {
    let repo = TeacherRepository::new(&state.db);
    let mut responses = Vec::new();
    for teacher in repo.list().await? {
        responses.push(teacher_response(&repo, teacher).await?);
    }
    Ok(Json(responses))
}

/// Create a teacher profile
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    security(("bearer_auth" = [])),
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = TeacherResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "User already has a teacher profile", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn create_teacher(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTeacherRequest>,
) -> Result<(StatusCode, Json<TeacherResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("specialization", validators::required(&request.specialization, 100));
    check_person(
        &mut errors,
        Some(&request.phone),
        Some(&request.gender),
        Some(request.birth_date),
    );
    check_hire_date(&mut errors, request.birth_date, request.hire_date);
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<user::Entity, _>(&state.db, &mut errors, "user_id", Some(request.user_id)).await?;
    check_reference::<department::Entity, _>(
        &state.db,
        &mut errors,
        "department_id",
        Some(request.department_id),
    )
    .await?;
    errors.into_result()?;

    let repo = TeacherRepository::new(&state.db);
    let teacher = repo
        .save(
            teacher::ActiveModel {
                user_id: Set(request.user_id),
                department_id: Set(request.department_id),
                specialization: Set(request.specialization.trim().to_string()),
                phone: Set(request.phone),
                birth_date: Set(request.birth_date),
                gender: Set(request.gender),
                hire_date: Set(request.hire_date),
                ..Default::default()
            },
            None,
            request.address,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(teacher_response(&repo, teacher).await?)))
}

/// Get a teacher profile
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher", body = TeacherResponse),
        (status = 404, description = "Teacher not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn get_teacher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let repo = TeacherRepository::new(&state.db);
    let teacher = repo.get(id).await?;
    Ok(Json(teacher_response(&repo, teacher).await?))
}

/// Update a teacher profile
#[utoipa::path(
    patch,
    path = "/api/v1/teachers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    request_body = UpdateTeacherRequest,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Teacher not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn update_teacher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateTeacherRequest>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let repo = TeacherRepository::new(&state.db);
    let current = repo.get(id).await?;

    let mut errors = FieldErrors::new();
    if let Some(specialization) = &request.specialization {
        errors.check("specialization", validators::required(specialization, 100));
    }
    check_person(
        &mut errors,
        request.phone.as_deref(),
        request.gender.as_deref(),
        request.birth_date,
    );
    check_hire_date(
        &mut errors,
        request.birth_date.unwrap_or(current.birth_date),
        request.hire_date.unwrap_or(current.hire_date),
    );
    if let Some(address) = &request.address {
        check_address(&mut errors, "address", address);
    }
    check_reference::<department::Entity, _>(&state.db, &mut errors, "department_id", request.department_id)
        .await?;
    errors.into_result()?;

    let existing_address = current.address_id;
    let mut teacher = current.into_active_model();
    if let Some(department_id) = request.department_id {
        teacher.department_id = Set(department_id);
    }
    if let Some(specialization) = request.specialization {
        teacher.specialization = Set(specialization.trim().to_string());
    }
    if let Some(phone) = request.phone {
        teacher.phone = Set(phone);
    }
    if let Some(birth_date) = request.birth_date {
        teacher.birth_date = Set(birth_date);
    }
    if let Some(gender) = request.gender {
        teacher.gender = Set(gender);
    }
    if let Some(hire_date) = request.hire_date {
        teacher.hire_date = Set(hire_date);
    }

    let teacher = repo.save(teacher, existing_address, request.address).await?;
    Ok(Json(teacher_response(&repo, teacher).await?))
}

/// Delete a teacher profile and its address
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 404, description = "Teacher not found", body = ApiError),
        (status = 409, description = "Teacher still has teaching assignments", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn delete_teacher(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    TeacherRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a teacher's profile image
#[utoipa::path(
    post,
    path = "/api/v1/teachers/{id}/image",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = TeacherResponse),
        (status = 400, description = "Missing file or unsupported type", body = ApiError),
        (status = 404, description = "Teacher not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn upload_teacher_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    mut multipart: Multipart,
) -> Result<Json<TeacherResponse>, ApiError> {
    let repo = TeacherRepository::new(&state.db);
    let teacher = repo.get(id).await?;
    let path = store_media(&state.media, &mut multipart, MediaKind::Image, teacher.user_id).await?;

    let mut active = teacher.into_active_model();
    active.image = Set(Some(path));
    let teacher = repo.save(active, None, None).await?;
    Ok(Json(teacher_response(&repo, teacher).await?))
}

// Teaches

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeachRequest {
    pub section_id: i32,
    /// Defaults to the current semester
    pub semester_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeachResponse {
    pub id: i32,
    pub teacher_id: i32,
    pub course_id: i32,
    pub section_id: i32,
    pub semester_id: i32,
    pub school_year: i32,
    pub created_at: String,
}

impl From<teach::Model> for TeachResponse {
    fn from(model: teach::Model) -> Self {
        Self {
            id: model.id,
            teacher_id: model.teacher_id,
            course_id: model.course_id,
            section_id: model.section_id,
            semester_id: model.semester_id,
            school_year: model.school_year,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// List a teacher's teaching assignments
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/teaches",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teaching assignments", body = [TeachResponse]),
        (status = 404, description = "Teacher not found", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn list_teaches(
    State(state): State<AppState>,
    ApiPath(teacher_id): ApiPath<i32>,
) -> Result<Json<Vec<TeachResponse>>, ApiError> {
    let teaches = TeachRepository::new(&state.db)
        .list_for_teacher(teacher_id)
        .await?;
    Ok(Json(teaches.into_iter().map(TeachResponse::from).collect()))
}

/// Assign a teacher to a section
#[utoipa::path(
    post,
    path = "/api/v1/teachers/{id}/teaches",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Teacher id")),
    request_body = CreateTeachRequest,
    responses(
        (status = 201, description = "Assignment created", body = TeachResponse),
        (status = 400, description = "Validation failed or no current semester", body = ApiError),
        (status = 404, description = "Teacher not found", body = ApiError),
        (status = 409, description = "Section already taught this semester", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn create_teach(
    State(state): State<AppState>,
    ApiPath(teacher_id): ApiPath<i32>,
    ApiJson(request): ApiJson<CreateTeachRequest>,
) -> Result<(StatusCode, Json<TeachResponse>), ApiError> {
    TeacherRepository::new(&state.db).get(teacher_id).await?;

    let mut errors = FieldErrors::new();
    check_reference::<section::Entity, _>(&state.db, &mut errors, "section_id", Some(request.section_id))
        .await?;
    check_reference::<semester::Entity, _>(&state.db, &mut errors, "semester_id", request.semester_id)
        .await?;
    errors.into_result()?;

    let teach = TeachRepository::new(&state.db)
        .create(teacher_id, request.section_id, request.semester_id)
        .await?;
    Ok((StatusCode::CREATED, Json(teach.into())))
}

/// Get a teaching assignment
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}/teaches/{teach_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Teacher id"),
        ("teach_id" = i32, Path, description = "Teach id")
    ),
    responses(
        (status = 200, description = "Teaching assignment", body = TeachResponse),
        (status = 404, description = "Teach not found for this teacher", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn get_teach(
    State(state): State<AppState>,
    ApiPath((teacher_id, teach_id)): ApiPath<(i32, i32)>,
) -> Result<Json<TeachResponse>, ApiError> {
    let teach = TeachRepository::new(&state.db)
        .find_for_teacher(teacher_id, teach_id)
        .await?
        .ok_or_else(|| not_found("NOT_FOUND", &format!("Teach {} not found", teach_id)))?;
    Ok(Json(teach.into()))
}

/// Remove a teaching assignment
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{id}/teaches/{teach_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Teacher id"),
        ("teach_id" = i32, Path, description = "Teach id")
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 404, description = "Teach not found for this teacher", body = ApiError)
    ),
    tag = "staff"
)]
pub async fn delete_teach(
    State(state): State<AppState>,
    ApiPath((teacher_id, teach_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    TeachRepository::new(&state.db).delete(teacher_id, teach_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
