//! # Authentication
//!
//! JWT bearer authentication for local user accounts. The middleware resolves
//! an optional bearer token into a [`CurrentUser`] request extension; routes
//! that require a caller extract [`AuthUser`] or sit behind an access policy.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::models::user;
use crate::permissions::Role;
use crate::repositories::UserRepository;
use crate::server::AppState;

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// Authenticated caller resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
    pub groups: Vec<String>,
}

impl CurrentUser {
    pub fn in_group(&self, name: &str) -> bool {
        self.groups.iter().any(|group| group == name)
    }

    pub fn is_admin(&self) -> bool {
        self.is_staff || self.in_group(Role::Admin.group_name())
    }

    /// Admins hold every role.
    pub fn has_role(&self, role: Role) -> bool {
        self.is_admin() || self.in_group(role.group_name())
    }
}

/// Extractor for routes that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Issues an access token for `user`.
pub fn issue_token(config: &AppConfig, user: &user::Model) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now,
        exp: now + config.jwt_ttl_seconds,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| {
        tracing::error!(error = %err, "Failed to sign access token");
        ApiError::from(anyhow::anyhow!("token signing failed"))
    })
}

/// Verifies signature and expiry, returning the claims.
pub fn verify_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "Rejected bearer token");
        unauthorized(Some("Invalid or expired token"))
    })
}

/// Resolves an optional bearer token into a [`CurrentUser`] extension.
///
/// Requests without an `Authorization` header pass through anonymously; a
/// header that is present but invalid is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?.map(str::to_owned);
    if let Some(token) = token {
        let claims = verify_token(&state.config, &token)?;
        let current = load_current_user(&state, &claims).await?;
        tracing::debug!(user_id = current.id, "Authenticated request");
        request.extensions_mut().insert(current);
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = value
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("JWT "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

async fn load_current_user(state: &AppState, claims: &Claims) -> Result<CurrentUser, ApiError> {
    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| unauthorized(Some("Invalid or expired token")))?;

    let repo = UserRepository::new(&state.db);
    let user = match repo.get(user_id).await {
        Ok(user) if user.is_active => user,
        Ok(_) | Err(crate::error::RepositoryError::NotFound(_)) => {
            return Err(unauthorized(Some("User is inactive or no longer exists")));
        }
        Err(err) => return Err(err.into()),
    };

    let groups = repo
        .groups(&user)
        .await?
        .into_iter()
        .map(|group| group.name)
        .collect();

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        is_staff: user.is_staff,
        groups,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| unauthorized(Some("Authentication credentials were not provided")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            jwt_secret: "unit-test-secret-that-is-long-enough!".to_string(),
            ..Default::default()
        }
    }

    fn user() -> user::Model {
        let now = chrono::Utc::now().into();
        user::Model {
            id: 42,
            username: "ada".to_string(),
            email: "ada@school.test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: String::new(),
            is_staff: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let config = config();
        let token = issue_token(&config, &user()).unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.exp - claims.iat, config.jwt_ttl_seconds);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = issue_token(&config(), &user()).unwrap();
        let other = AppConfig {
            jwt_secret: "a-completely-different-secret-value".to_string(),
            ..Default::default()
        };
        let err = verify_token(&other, &token).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let config = config();
        let claims = Claims {
            sub: "42".to_string(),
            username: "ada".to_string(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers).unwrap(), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), Some("abc.def"));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn admin_holds_every_role() {
        let mut caller = CurrentUser {
            id: 1,
            username: "root".to_string(),
            is_staff: true,
            groups: vec![],
        };
        assert!(caller.is_admin());
        assert!(caller.has_role(Role::Registrar));

        caller.is_staff = false;
        caller.groups = vec!["Teacher".to_string()];
        assert!(!caller.is_admin());
        assert!(caller.has_role(Role::Teacher));
        assert!(!caller.has_role(Role::Registrar));
    }
}
