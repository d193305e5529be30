//! # API Handlers
//!
//! HTTP endpoint handlers for the School Administration API, grouped by
//! resource. Each submodule exposes a `router()` carrying its access policy.

pub mod attendance;
pub mod auth;
pub mod curriculum;
pub mod grades;
pub mod groups;
pub mod organization;
pub mod staff;
pub mod students;
pub mod types;
pub mod uploads;

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::repositories::{AddressInput, exists};
use crate::server::AppState;
use crate::validators::{self, FieldErrors};

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

/// Reports service and database health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match crate::db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}

/// Records a field error when the referenced row does not exist.
pub(crate) async fn check_reference<E, C>(
    db: &C,
    errors: &mut FieldErrors,
    field: &str,
    id: Option<i32>,
) -> Result<(), ApiError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    if let Some(id) = id
        && !exists::<E, _>(db, id).await?
    {
        errors.add(field, format!("Invalid pk \"{}\" - object does not exist.", id));
    }
    Ok(())
}

/// Validates every part of an embedded address under `prefix`.
pub(crate) fn check_address(errors: &mut FieldErrors, prefix: &str, address: &AddressInput) {
    errors
        .check(&format!("{prefix}.street"), validators::required(&address.street, 255))
        .check(&format!("{prefix}.city"), validators::required(&address.city, 150))
        .check(&format!("{prefix}.province"), validators::required(&address.province, 150))
        .check(&format!("{prefix}.postal_code"), validators::required(&address.postal_code, 20))
        .check(&format!("{prefix}.country"), validators::required(&address.country, 100));
}

/// Contact and birth fields shared by every profile kind.
pub(crate) fn check_person(
    errors: &mut FieldErrors,
    phone: Option<&str>,
    gender: Option<&str>,
    birth_date: Option<chrono::NaiveDate>,
) {
    if let Some(phone) = phone {
        errors.check("phone", validators::phone(phone));
    }
    if let Some(gender) = gender {
        errors.check("gender", validators::gender(gender));
    }
    if let Some(birth_date) = birth_date
        && birth_date >= chrono::Utc::now().date_naive()
    {
        errors.add("birth_date", "Birth date must be in the past.");
    }
}

/// Address body shared by nested `address` endpoints and profile payloads.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressResponse {
    pub id: i32,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

impl From<crate::models::address::Model> for AddressResponse {
    fn from(model: crate::models::address::Model) -> Self {
        Self {
            id: model.id,
            street: model.street,
            city: model.city,
            province: model.province,
            postal_code: model.postal_code,
            country: model.country,
        }
    }
}

#[cfg(test)]
mod tests;
