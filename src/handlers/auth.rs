//! # Auth API Handlers
//!
//! Token issuance, registration and user account management. Registration
//! and token creation are anonymous; the remaining routes check the caller
//! in the handler because their rules depend on the target user.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthUser, CurrentUser, issue_token};
use crate::error::{ApiError, forbidden, unauthorized};
use crate::handlers::types::{ApiJson, ApiPath, ApiQuery, PageParams, PaginatedResponse};
use crate::models::{group, user};
use crate::repositories::user::UserChanges;
use crate::repositories::{NewUser, UserRepository};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

const NAME_MAX_LEN: usize = 150;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/jwt/create", post(create_token))
        .route("/auth/users", get(list_users).post(register_user))
        .route("/auth/users/me", get(me))
        .route("/auth/users/{id}", get(get_user).patch(update_user))
        .route("/auth/users/{id}/groups", post(add_user_groups))
}

/// Credentials exchanged for an access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenRequest {
    #[schema(example = "jdoe")]
    pub username: String,
    pub password: String,
}

/// Bearer access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: u64,
}

/// Registration payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "jdoe@school.test")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Editable account fields; PATCH only
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupIdsRequest {
    pub group_ids: Vec<i32>,
}

/// Group reference embedded in user payloads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub id: i32,
    pub name: String,
}

impl From<group::Model> for GroupSummary {
    fn from(model: group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// User account as returned by the API; never includes the password hash
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    /// Present on detail responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupSummary>>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            is_staff: model.is_staff,
            is_active: model.is_active,
            groups: None,
        }
    }
}

impl UserResponse {
    fn with_groups(model: user::Model, groups: Vec<group::Model>) -> Self {
        let mut response = Self::from(model);
        response.groups = Some(groups.into_iter().map(GroupSummary::from).collect());
        response
    }
}

fn require_admin(caller: &CurrentUser) -> Result<(), ApiError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(forbidden(Some("Only administrators may perform this action")))
    }
}

fn require_self_or_admin(caller: &CurrentUser, user_id: i32) -> Result<(), ApiError> {
    if caller.id == user_id || caller.is_admin() {
        Ok(())
    } else {
        Err(forbidden(Some("You may only access your own account")))
    }
}

async fn user_detail(state: &AppState, user_id: i32) -> Result<UserResponse, ApiError> {
    let repo = UserRepository::new(&state.db);
    let user = repo.get(user_id).await?;
    let groups = repo.groups(&user).await?;
    Ok(UserResponse::with_groups(user, groups))
}

/// Obtain a JWT access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/jwt/create",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Malformed request", body = ApiError),
        (status = 401, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = UserRepository::new(&state.db)
        .authenticate(&request.username, &request.password)
        .await?;

    let Some(user) = user else {
        tracing::info!(username = %request.username, "Failed login attempt");
        return Err(unauthorized(Some(
            "No active account found with the given credentials",
        )));
    };

    let access = issue_token(&state.config, &user)?;
    tracing::info!(user_id = user.id, "Issued access token");

    Ok(Json(TokenResponse {
        access,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_ttl_seconds,
    }))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/v1/auth/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Username or email already taken", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut errors = FieldErrors::new();
    errors
        .check("username", validators::username(&request.username))
        .check("email", validators::email(&request.email))
        .check("first_name", validators::required(&request.first_name, NAME_MAX_LEN))
        .check("last_name", validators::required(&request.last_name, NAME_MAX_LEN))
        .check("password", validators::password(&request.password));
    if request.password != request.confirm_password {
        errors.add("confirm_password", "Passwords do not match.");
    }

    let repo = UserRepository::new(&state.db);
    if errors.is_empty() && repo.find_by_username(&request.username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    errors.into_result()?;

    let user = repo
        .create_with_iterations(
            NewUser {
                username: request.username,
                email: request.email.trim().to_string(),
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                password: request.password,
                is_staff: false,
            },
            state.config.password_iterations,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// List user accounts (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    require_admin(&caller)?;
    let page = UserRepository::new(&state.db).list(page.resolve()?).await?;
    Ok(Json(PaginatedResponse::from_page(page, UserResponse::from)))
}

/// The authenticated caller's account
#[utoipa::path(
    get,
    path = "/api/v1/auth/users/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(user_detail(&state, caller.id).await?))
}

/// Get a user with their groups
#[utoipa::path(
    get,
    path = "/api/v1/auth/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Not your account", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    require_self_or_admin(&caller, id)?;
    Ok(Json(user_detail(&state, id).await?))
}

/// Update a user's names or email
#[utoipa::path(
    patch,
    path = "/api/v1/auth/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Not your account", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_self_or_admin(&caller, id)?;

    let mut errors = FieldErrors::new();
    if let Some(first_name) = &request.first_name {
        errors.check("first_name", validators::required(first_name, NAME_MAX_LEN));
    }
    if let Some(last_name) = &request.last_name {
        errors.check("last_name", validators::required(last_name, NAME_MAX_LEN));
    }
    if let Some(email) = &request.email {
        errors.check("email", validators::email(email));
    }
    errors.into_result()?;

    UserRepository::new(&state.db)
        .update(
            id,
            UserChanges {
                first_name: request.first_name.map(|v| v.trim().to_string()),
                last_name: request.last_name.map(|v| v.trim().to_string()),
                email: request.email.map(|v| v.trim().to_string()),
            },
        )
        .await?;

    Ok(Json(user_detail(&state, id).await?))
}

/// Add a user to groups (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/auth/users/{id}/groups",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User id")),
    request_body = GroupIdsRequest,
    responses(
        (status = 200, description = "Groups the user now belongs to", body = [GroupSummary]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Insufficient permissions", body = ApiError),
        (status = 404, description = "User or group not found", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn add_user_groups(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<GroupIdsRequest>,
) -> Result<Json<Vec<GroupSummary>>, ApiError> {
    require_admin(&caller)?;
    let groups = UserRepository::new(&state.db)
        .add_groups(id, &request.group_ids)
        .await?;
    tracing::info!(user_id = id, admin_id = caller.id, "Updated user groups");
    Ok(Json(groups.into_iter().map(GroupSummary::from).collect()))
}
