//! # Organization API Handlers
//!
//! Departments with their majors, buildings with their offices, classrooms,
//! and the address sub-resources of departments and buildings. Reads are
//! open to any authenticated user; writes require an administrator.

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

use crate::error::ApiError;
use crate::handlers::types::{ApiJson, ApiPath, ApiQuery, nullable};
use crate::handlers::{AddressResponse, check_address, check_reference};
use crate::models::{building, classroom, department, major, office};
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{
    AddressInput, BuildingRepository, ClassroomRepository, DepartmentRepository, MajorRepository,
    OfficeRepository,
};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route(
            "/departments/{id}/address",
            get(get_department_address)
                .put(put_department_address)
                .delete(delete_department_address),
        )
        .route("/departments/{id}/majors", get(list_majors).post(create_major))
        .route(
            "/departments/{id}/majors/{major_id}",
            get(get_major).patch(update_major).delete(delete_major),
        )
        .route("/buildings", get(list_buildings).post(create_building))
        .route(
            "/buildings/{id}",
            get(get_building).patch(update_building).delete(delete_building),
        )
        .route(
            "/buildings/{id}/address",
            get(get_building_address)
                .put(put_building_address)
                .delete(delete_building_address),
        )
        .route("/buildings/{id}/offices", get(list_offices).post(create_office))
        .route(
            "/buildings/{id}/offices/{office_id}",
            get(get_office).patch(update_office).delete(delete_office),
        )
        .route("/classrooms", get(list_classrooms).post(create_classroom))
        .route(
            "/classrooms/{id}",
            get(get_classroom)
                .patch(update_classroom)
                .delete(delete_classroom),
        )
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::AdminOrReadOnly,
            enforce,
        ))
}

// Departments

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDepartmentRequest {
    #[schema(example = "Computer Science")]
    pub name: String,
    #[schema(example = 250000.00)]
    pub budget: f64,
    #[serde(default)]
    pub duty: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    pub budget: Option<f64>,
    pub duty: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepartmentResponse {
    pub id: i32,
    pub name: String,
    pub budget: f64,
    pub duty: String,
    pub address_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<department::Model> for DepartmentResponse {
    fn from(model: department::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            budget: model.budget,
            duty: model.duty,
            address_id: model.address_id,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All departments", body = [DepartmentResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let departments = DepartmentRepository::new(&state.db).list().await?;
    Ok(Json(departments.into_iter().map(DepartmentResponse::from).collect()))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    security(("bearer_auth" = [])),
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError),
        (status = 409, description = "Department name taken", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn create_department(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<DepartmentResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check("name", validators::required(&request.name, 200))
        .check("budget", validators::budget(request.budget));
    errors.into_result()?;

    let department = DepartmentRepository::new(&state.db)
        .save(department::ActiveModel {
            name: Set(request.name.trim().to_string()),
            budget: Set(request.budget),
            duty: Set(request.duty),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(department.into())))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department", body = DepartmentResponse),
        (status = 404, description = "Department not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_department(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    Ok(Json(DepartmentRepository::new(&state.db).get(id).await?.into()))
}

/// Update a department
#[utoipa::path(
    patch,
    path = "/api/v1/departments/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = DepartmentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Department not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn update_department(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateDepartmentRequest>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &request.name {
        errors.check("name", validators::required(name, 200));
    }
    if let Some(budget) = request.budget {
        errors.check("budget", validators::budget(budget));
    }
    errors.into_result()?;

    let repo = DepartmentRepository::new(&state.db);
    let mut department = repo.get(id).await?.into_active_model();
    if let Some(name) = request.name {
        department.name = Set(name.trim().to_string());
    }
    if let Some(budget) = request.budget {
        department.budget = Set(budget);
    }
    if let Some(duty) = request.duty {
        department.duty = Set(duty);
    }
    Ok(Json(repo.save(department).await?.into()))
}

/// Delete a department and its address
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found", body = ApiError),
        (status = 409, description = "Department still referenced", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_department(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    DepartmentRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a department's address
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Address", body = AddressResponse),
        (status = 404, description = "Department or address not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_department_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<AddressResponse>, ApiError> {
    let address = DepartmentRepository::new(&state.db)
        .address(id)
        .await?
        .ok_or_else(|| missing_address("Department", id))?;
    Ok(Json(address.into()))
}

/// Create or replace a department's address
#[utoipa::path(
    put,
    path = "/api/v1/departments/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address stored", body = AddressResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Department not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn put_department_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<AddressInput>,
) -> Result<Json<AddressResponse>, ApiError> {
    validate_address(&request)?;
    let address = DepartmentRepository::new(&state.db)
        .put_address(id, request)
        .await?;
    Ok(Json(address.into()))
}

/// Remove a department's address
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 204, description = "Address removed"),
        (status = 404, description = "Department or address not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_department_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    DepartmentRepository::new(&state.db).delete_address(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_address(address: &AddressInput) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    check_address(&mut errors, "address", address);
    errors.into_result()
}

fn missing_address(owner: &str, id: i32) -> ApiError {
    crate::error::not_found("NOT_FOUND", &format!("{} {} has no address", owner, id))
}

// Majors

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MajorRequest {
    #[schema(example = "Software Engineering")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MajorResponse {
    pub id: i32,
    pub name: String,
    pub department_id: i32,
}

impl From<major::Model> for MajorResponse {
    fn from(model: major::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            department_id: model.department_id,
        }
    }
}

fn validate_major(request: &MajorRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("name", validators::required(&request.name, 150));
    errors.into_result()
}

/// List a department's majors
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}/majors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Majors", body = [MajorResponse]),
        (status = 404, description = "Department not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn list_majors(
    State(state): State<AppState>,
    ApiPath(department_id): ApiPath<i32>,
) -> Result<Json<Vec<MajorResponse>>, ApiError> {
    let majors = MajorRepository::new(&state.db)
        .list_for_department(department_id)
        .await?;
    Ok(Json(majors.into_iter().map(MajorResponse::from).collect()))
}

/// Add a major to a department
#[utoipa::path(
    post,
    path = "/api/v1/departments/{id}/majors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Department id")),
    request_body = MajorRequest,
    responses(
        (status = 201, description = "Major created", body = MajorResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Department not found", body = ApiError),
        (status = 409, description = "Major already exists in department", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn create_major(
    State(state): State<AppState>,
    ApiPath(department_id): ApiPath<i32>,
    ApiJson(request): ApiJson<MajorRequest>,
) -> Result<(StatusCode, Json<MajorResponse>), ApiError> {
    validate_major(&request)?;
    DepartmentRepository::new(&state.db).get(department_id).await?;
    let major = MajorRepository::new(&state.db)
        .save(major::ActiveModel {
            name: Set(request.name.trim().to_string()),
            department_id: Set(department_id),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(major.into())))
}

/// Get a major
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}/majors/{major_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Department id"),
        ("major_id" = i32, Path, description = "Major id")
    ),
    responses(
        (status = 200, description = "Major", body = MajorResponse),
        (status = 404, description = "Major not found in department", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_major(
    State(state): State<AppState>,
    ApiPath((department_id, major_id)): ApiPath<(i32, i32)>,
) -> Result<Json<MajorResponse>, ApiError> {
    let major = MajorRepository::new(&state.db)
        .get_in_department(department_id, major_id)
        .await?;
    Ok(Json(major.into()))
}

/// Rename a major
#[utoipa::path(
    patch,
    path = "/api/v1/departments/{id}/majors/{major_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Department id"),
        ("major_id" = i32, Path, description = "Major id")
    ),
    request_body = MajorRequest,
    responses(
        (status = 200, description = "Major updated", body = MajorResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Major not found in department", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn update_major(
    State(state): State<AppState>,
    ApiPath((department_id, major_id)): ApiPath<(i32, i32)>,
    ApiJson(request): ApiJson<MajorRequest>,
) -> Result<Json<MajorResponse>, ApiError> {
    validate_major(&request)?;
    let repo = MajorRepository::new(&state.db);
    let mut major = repo
        .get_in_department(department_id, major_id)
        .await?
        .into_active_model();
    major.name = Set(request.name.trim().to_string());
    Ok(Json(repo.save(major).await?.into()))
}

/// Delete a major
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}/majors/{major_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Department id"),
        ("major_id" = i32, Path, description = "Major id")
    ),
    responses(
        (status = 204, description = "Major deleted"),
        (status = 404, description = "Major not found in department", body = ApiError),
        (status = 409, description = "Major has students", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_major(
    State(state): State<AppState>,
    ApiPath((department_id, major_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let repo = MajorRepository::new(&state.db);
    repo.get_in_department(department_id, major_id).await?;
    repo.delete(major_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Buildings

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingRequest {
    #[schema(example = "Main Hall")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingResponse {
    pub id: i32,
    pub name: String,
    pub address_id: Option<i32>,
}

impl From<building::Model> for BuildingResponse {
    fn from(model: building::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address_id: model.address_id,
        }
    }
}

fn validate_building(request: &BuildingRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("name", validators::required(&request.name, 150));
    errors.into_result()
}

/// List buildings
#[utoipa::path(
    get,
    path = "/api/v1/buildings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All buildings", body = [BuildingResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn list_buildings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BuildingResponse>>, ApiError> {
    let buildings = BuildingRepository::new(&state.db).list().await?;
    Ok(Json(buildings.into_iter().map(BuildingResponse::from).collect()))
}

/// Create a building
#[utoipa::path(
    post,
    path = "/api/v1/buildings",
    security(("bearer_auth" = [])),
    request_body = BuildingRequest,
    responses(
        (status = 201, description = "Building created", body = BuildingResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Building name taken", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn create_building(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BuildingRequest>,
) -> Result<(StatusCode, Json<BuildingResponse>), ApiError> {
    validate_building(&request)?;
    let building = BuildingRepository::new(&state.db)
        .save(building::ActiveModel {
            name: Set(request.name.trim().to_string()),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(building.into())))
}

/// Get a building
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    responses(
        (status = 200, description = "Building", body = BuildingResponse),
        (status = 404, description = "Building not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_building(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<BuildingResponse>, ApiError> {
    Ok(Json(BuildingRepository::new(&state.db).get(id).await?.into()))
}

/// Rename a building
#[utoipa::path(
    patch,
    path = "/api/v1/buildings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    request_body = BuildingRequest,
    responses(
        (status = 200, description = "Building updated", body = BuildingResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Building not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn update_building(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<BuildingRequest>,
) -> Result<Json<BuildingResponse>, ApiError> {
    validate_building(&request)?;
    let repo = BuildingRepository::new(&state.db);
    let mut building = repo.get(id).await?.into_active_model();
    building.name = Set(request.name.trim().to_string());
    Ok(Json(repo.save(building).await?.into()))
}

/// Delete a building with its offices and address
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    responses(
        (status = 204, description = "Building deleted"),
        (status = 404, description = "Building not found", body = ApiError),
        (status = 409, description = "Building still has classrooms", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_building(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    BuildingRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a building's address
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    responses(
        (status = 200, description = "Address", body = AddressResponse),
        (status = 404, description = "Building or address not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_building_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<AddressResponse>, ApiError> {
    let address = BuildingRepository::new(&state.db)
        .address(id)
        .await?
        .ok_or_else(|| missing_address("Building", id))?;
    Ok(Json(address.into()))
}

/// Create or replace a building's address
#[utoipa::path(
    put,
    path = "/api/v1/buildings/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address stored", body = AddressResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Building not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn put_building_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<AddressInput>,
) -> Result<Json<AddressResponse>, ApiError> {
    validate_address(&request)?;
    let address = BuildingRepository::new(&state.db)
        .put_address(id, request)
        .await?;
    Ok(Json(address.into()))
}

/// Remove a building's address
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{id}/address",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    responses(
        (status = 204, description = "Address removed"),
        (status = 404, description = "Building or address not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_building_address(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    BuildingRepository::new(&state.db).delete_address(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Offices

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOfficeRequest {
    #[schema(example = "Registrar's Office")]
    pub name: String,
    pub department_id: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateOfficeRequest {
    pub name: Option<String>,
    /// `null` detaches the office from its department
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub department_id: Option<Option<i32>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfficeResponse {
    pub id: i32,
    pub name: String,
    pub building_id: i32,
    pub department_id: Option<i32>,
}

impl From<office::Model> for OfficeResponse {
    fn from(model: office::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            building_id: model.building_id,
            department_id: model.department_id,
        }
    }
}

/// List a building's offices
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}/offices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    responses(
        (status = 200, description = "Offices", body = [OfficeResponse]),
        (status = 404, description = "Building not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn list_offices(
    State(state): State<AppState>,
    ApiPath(building_id): ApiPath<i32>,
) -> Result<Json<Vec<OfficeResponse>>, ApiError> {
    let offices = OfficeRepository::new(&state.db)
        .list_for_building(building_id)
        .await?;
    Ok(Json(offices.into_iter().map(OfficeResponse::from).collect()))
}

/// Add an office to a building
#[utoipa::path(
    post,
    path = "/api/v1/buildings/{id}/offices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Building id")),
    request_body = CreateOfficeRequest,
    responses(
        (status = 201, description = "Office created", body = OfficeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Building not found", body = ApiError),
        (status = 409, description = "Office already exists in building", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn create_office(
    State(state): State<AppState>,
    ApiPath(building_id): ApiPath<i32>,
    ApiJson(request): ApiJson<CreateOfficeRequest>,
) -> Result<(StatusCode, Json<OfficeResponse>), ApiError> {
    BuildingRepository::new(&state.db).get(building_id).await?;

    let mut errors = FieldErrors::new();
    errors.check("name", validators::required(&request.name, 150));
    check_reference::<department::Entity, _>(
        &state.db,
        &mut errors,
        "department_id",
        request.department_id,
    )
    .await?;
    errors.into_result()?;

    let office = OfficeRepository::new(&state.db)
        .save(office::ActiveModel {
            name: Set(request.name.trim().to_string()),
            building_id: Set(building_id),
            department_id: Set(request.department_id),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(office.into())))
}

/// Get an office
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}/offices/{office_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Building id"),
        ("office_id" = i32, Path, description = "Office id")
    ),
    responses(
        (status = 200, description = "Office", body = OfficeResponse),
        (status = 404, description = "Office not found in building", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_office(
    State(state): State<AppState>,
    ApiPath((building_id, office_id)): ApiPath<(i32, i32)>,
) -> Result<Json<OfficeResponse>, ApiError> {
    let office = OfficeRepository::new(&state.db)
        .get_in_building(building_id, office_id)
        .await?;
    Ok(Json(office.into()))
}

/// Update an office
#[utoipa::path(
    patch,
    path = "/api/v1/buildings/{id}/offices/{office_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Building id"),
        ("office_id" = i32, Path, description = "Office id")
    ),
    request_body = UpdateOfficeRequest,
    responses(
        (status = 200, description = "Office updated", body = OfficeResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Office not found in building", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn update_office(
    State(state): State<AppState>,
    ApiPath((building_id, office_id)): ApiPath<(i32, i32)>,
    ApiJson(request): ApiJson<UpdateOfficeRequest>,
) -> Result<Json<OfficeResponse>, ApiError> {
    let repo = OfficeRepository::new(&state.db);
    let mut office = repo
        .get_in_building(building_id, office_id)
        .await?
        .into_active_model();

    let mut errors = FieldErrors::new();
    if let Some(name) = &request.name {
        errors.check("name", validators::required(name, 150));
    }
    check_reference::<department::Entity, _>(
        &state.db,
        &mut errors,
        "department_id",
        request.department_id.flatten(),
    )
    .await?;
    errors.into_result()?;

    if let Some(name) = request.name {
        office.name = Set(name.trim().to_string());
    }
    if let Some(department_id) = request.department_id {
        office.department_id = Set(department_id);
    }
    Ok(Json(repo.save(office).await?.into()))
}

/// Delete an office
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{id}/offices/{office_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Building id"),
        ("office_id" = i32, Path, description = "Office id")
    ),
    responses(
        (status = 204, description = "Office deleted"),
        (status = 404, description = "Office not found in building", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_office(
    State(state): State<AppState>,
    ApiPath((building_id, office_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let repo = OfficeRepository::new(&state.db);
    repo.get_in_building(building_id, office_id).await?;
    repo.delete(office_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Classrooms

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassroomFilter {
    /// Only classrooms in this building
    pub building_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateClassroomRequest {
    #[schema(example = "R101")]
    pub name: String,
    #[schema(example = "10x12m")]
    pub dimension: String,
    pub building_id: i32,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateClassroomRequest {
    pub name: Option<String>,
    pub dimension: Option<String>,
    pub building_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassroomResponse {
    pub id: i32,
    pub name: String,
    pub dimension: String,
    pub building_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<classroom::Model> for ClassroomResponse {
    fn from(model: classroom::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            dimension: model.dimension,
            building_id: model.building_id,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// List classrooms
#[utoipa::path(
    get,
    path = "/api/v1/classrooms",
    security(("bearer_auth" = [])),
    params(ClassroomFilter),
    responses(
        (status = 200, description = "Classrooms", body = [ClassroomResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn list_classrooms(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ClassroomFilter>,
) -> Result<Json<Vec<ClassroomResponse>>, ApiError> {
    let classrooms = ClassroomRepository::new(&state.db)
        .list(filter.building_id)
        .await?;
    Ok(Json(classrooms.into_iter().map(ClassroomResponse::from).collect()))
}

/// Create a classroom
#[utoipa::path(
    post,
    path = "/api/v1/classrooms",
    security(("bearer_auth" = [])),
    request_body = CreateClassroomRequest,
    responses(
        (status = 201, description = "Classroom created", body = ClassroomResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Classroom name taken", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn create_classroom(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateClassroomRequest>,
) -> Result<(StatusCode, Json<ClassroomResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check("name", validators::required(&request.name, 150))
        .check("dimension", validators::required(&request.dimension, 150));
    check_reference::<building::Entity, _>(
        &state.db,
        &mut errors,
        "building_id",
        Some(request.building_id),
    )
    .await?;
    errors.into_result()?;

    let classroom = ClassroomRepository::new(&state.db)
        .save(classroom::ActiveModel {
            name: Set(request.name.trim().to_string()),
            dimension: Set(request.dimension.trim().to_string()),
            building_id: Set(request.building_id),
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(classroom.into())))
}

/// Get a classroom
#[utoipa::path(
    get,
    path = "/api/v1/classrooms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 200, description = "Classroom", body = ClassroomResponse),
        (status = 404, description = "Classroom not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn get_classroom(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    Ok(Json(ClassroomRepository::new(&state.db).get(id).await?.into()))
}

/// Update a classroom
#[utoipa::path(
    patch,
    path = "/api/v1/classrooms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Classroom id")),
    request_body = UpdateClassroomRequest,
    responses(
        (status = 200, description = "Classroom updated", body = ClassroomResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Classroom not found", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn update_classroom(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateClassroomRequest>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let repo = ClassroomRepository::new(&state.db);
    let mut classroom = repo.get(id).await?.into_active_model();

    let mut errors = FieldErrors::new();
    if let Some(name) = &request.name {
        errors.check("name", validators::required(name, 150));
    }
    if let Some(dimension) = &request.dimension {
        errors.check("dimension", validators::required(dimension, 150));
    }
    check_reference::<building::Entity, _>(&state.db, &mut errors, "building_id", request.building_id)
        .await?;
    errors.into_result()?;

    if let Some(name) = request.name {
        classroom.name = Set(name.trim().to_string());
    }
    if let Some(dimension) = request.dimension {
        classroom.dimension = Set(dimension.trim().to_string());
    }
    if let Some(building_id) = request.building_id {
        classroom.building_id = Set(building_id);
    }
    Ok(Json(repo.save(classroom).await?.into()))
}

/// Delete a classroom
#[utoipa::path(
    delete,
    path = "/api/v1/classrooms/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Classroom id")),
    responses(
        (status = 204, description = "Classroom deleted"),
        (status = 404, description = "Classroom not found", body = ApiError),
        (status = 409, description = "Classroom has sections", body = ApiError)
    ),
    tag = "organization"
)]
pub async fn delete_classroom(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    ClassroomRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
