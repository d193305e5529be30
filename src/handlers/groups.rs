//! # Groups and Permissions API Handlers
//!
//! Role groups, their membership and permission sets. Every route is
//! restricted to administrators.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::types::{ApiJson, ApiPath, DetailResponse};
use crate::models::{group, permission};
use crate::permissions::{AccessPolicy, enforce};
use crate::repositories::{GroupRepository, PermissionRepository};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

const GROUP_NAME_MAX_LEN: usize = 150;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).patch(update_group).delete(delete_group),
        )
        .route("/groups/{id}/add_users", post(add_users))
        .route("/groups/{id}/remove_users", delete(remove_users))
        .route("/groups/{id}/permissions", put(set_permissions))
        .route("/permissions", get(list_permissions))
        .route("/permissions/{id}", get(get_permission))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::AdminOnly,
            enforce,
        ))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupRequest {
    #[schema(example = "Registrar")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserIdsRequest {
    pub user_ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionIdsRequest {
    pub permission_ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub id: i32,
    pub name: String,
    #[schema(example = "manage_students")]
    pub codename: String,
}

impl From<permission::Model> for PermissionResponse {
    fn from(model: permission::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            codename: model.codename,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: i32,
    pub name: String,
    /// Present on detail responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionResponse>>,
}

impl From<group::Model> for GroupResponse {
    fn from(model: group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            permissions: None,
        }
    }
}

fn validate_group(request: &GroupRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    errors.check("name", validators::required(&request.name, GROUP_NAME_MAX_LEN));
    errors.into_result()
}

async fn group_detail(state: &AppState, group: group::Model) -> Result<GroupResponse, ApiError> {
    let permissions = GroupRepository::new(&state.db).permissions(&group).await?;
    let mut response = GroupResponse::from(group);
    response.permissions = Some(permissions.into_iter().map(PermissionResponse::from).collect());
    Ok(response)
}

/// List groups
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All groups", body = [GroupResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = GroupRepository::new(&state.db).list().await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

/// Create a group
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    security(("bearer_auth" = [])),
    request_body = GroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Group name taken", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    validate_group(&request)?;
    let group = GroupRepository::new(&state.db)
        .create(request.name.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(group_detail(&state, group).await?)))
}

/// Get a group with its permissions
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group detail", body = GroupResponse),
        (status = 404, description = "Group not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = GroupRepository::new(&state.db).get(id).await?;
    Ok(Json(group_detail(&state, group).await?))
}

/// Rename a group
#[utoipa::path(
    patch,
    path = "/api/v1/groups/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    request_body = GroupRequest,
    responses(
        (status = 200, description = "Group renamed", body = GroupResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Group not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn update_group(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<GroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    validate_group(&request)?;
    let group = GroupRepository::new(&state.db)
        .rename(id, request.name.trim().to_string())
        .await?;
    Ok(Json(group_detail(&state, group).await?))
}

/// Delete a group
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    GroupRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add users to a group
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/add_users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    request_body = UserIdsRequest,
    responses(
        (status = 200, description = "Users added", body = DetailResponse),
        (status = 404, description = "Group or user not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn add_users(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UserIdsRequest>,
) -> Result<Json<DetailResponse>, ApiError> {
    GroupRepository::new(&state.db)
        .add_users(id, &request.user_ids)
        .await?;
    Ok(Json(DetailResponse::new("Successfully added to group")))
}

/// Remove users from a group
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}/remove_users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    request_body = UserIdsRequest,
    responses(
        (status = 200, description = "Users removed", body = DetailResponse),
        (status = 404, description = "Group not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn remove_users(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UserIdsRequest>,
) -> Result<Json<DetailResponse>, ApiError> {
    GroupRepository::new(&state.db)
        .remove_users(id, &request.user_ids)
        .await?;
    Ok(Json(DetailResponse::new("Successfully removed")))
}

/// Replace a group's permissions
#[utoipa::path(
    put,
    path = "/api/v1/groups/{id}/permissions",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Group id")),
    request_body = PermissionIdsRequest,
    responses(
        (status = 200, description = "Group with its new permissions", body = GroupResponse),
        (status = 404, description = "Group or permission not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn set_permissions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<PermissionIdsRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let repo = GroupRepository::new(&state.db);
    let permissions = repo.set_permissions(id, &request.permission_ids).await?;
    let mut response = GroupResponse::from(repo.get(id).await?);
    response.permissions = Some(permissions.into_iter().map(PermissionResponse::from).collect());
    Ok(Json(response))
}

/// List permissions
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All permissions", body = [PermissionResponse]),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PermissionResponse>>, ApiError> {
    let permissions = PermissionRepository::new(&state.db).list().await?;
    Ok(Json(permissions.into_iter().map(PermissionResponse::from).collect()))
}

/// Get a permission
#[utoipa::path(
    get,
    path = "/api/v1/permissions/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Permission id")),
    responses(
        (status = 200, description = "Permission", body = PermissionResponse),
        (status = 404, description = "Permission not found", body = ApiError)
    ),
    tag = "groups"
)]
pub async fn get_permission(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let permission = PermissionRepository::new(&state.db).get(id).await?;
    Ok(Json(PermissionResponse::from(permission)))
}
