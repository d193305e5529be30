//! # Tests for Handlers
//!
//! Unit tests for the root and health handlers and the shared validation
//! helpers.

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::config::AppConfig;
use crate::db::{init_pool, run_migrations};
use crate::handlers::{check_address, check_person, check_reference, health, root};
use crate::models::{ServiceInfo, department};
use crate::repositories::AddressInput;
use crate::server::AppState;
use crate::validators::FieldErrors;

fn test_state(db: DatabaseConnection) -> AppState {
    let config = AppConfig {
        media_root: std::env::temp_dir().join("school-admin-handler-tests"),
        ..Default::default()
    };
    AppState::new(config, db)
}

async fn migrated_db() -> DatabaseConnection {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        ..Default::default()
    };
    let db = init_pool(&config).await.expect("Failed to init test DB");
    run_migrations(&db).await.expect("Failed to migrate test DB");
    db
}

fn error_fields(errors: FieldErrors) -> Value {
    let error = errors.into_result().expect_err("expected field errors");
    assert_eq!(error.status, StatusCode::BAD_REQUEST);
    *error.details.expect("validation errors carry details")
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "school-admin");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;

    let json_value: Value =
        serde_json::to_value(&service_info).expect("Failed to serialize ServiceInfo");
    assert_eq!(json_value["service"], "school-admin");
    assert!(json_value.get("version").is_some());
}

#[test]
fn test_service_info_default() {
    let service_info = ServiceInfo::default();
    assert_eq!(service_info.service, "school-admin");
}

#[tokio::test]
async fn test_health_reports_ok_with_database() {
    let state = test_state(migrated_db().await);

    let (status, Json(body)) = health(State(state)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "ok");
    assert_eq!(body.database, "ok");
}

#[tokio::test]
async fn test_check_reference_flags_missing_rows() {
    let db = migrated_db().await;
    let mut errors = FieldErrors::new();

    check_reference::<department::Entity, _>(&db, &mut errors, "department_id", Some(42))
        .await
        .unwrap();
    check_reference::<department::Entity, _>(&db, &mut errors, "office_id", None)
        .await
        .unwrap();

    let fields = error_fields(errors);
    assert_eq!(
        fields["department_id"],
        "Invalid pk \"42\" - object does not exist."
    );
    assert!(fields.get("office_id").is_none());
}

#[test]
fn test_check_person_rejects_bad_values() {
    let mut errors = FieldErrors::new();
    let tomorrow = chrono::Utc::now().date_naive() + chrono::Duration::days(1);

    check_person(&mut errors, Some("not a phone"), Some("X"), Some(tomorrow));

    let fields = error_fields(errors);
    assert!(fields.get("phone").is_some());
    assert!(fields.get("gender").is_some());
    assert!(fields.get("birth_date").is_some());
}

#[test]
fn test_check_address_prefixes_fields() {
    let mut errors = FieldErrors::new();
    let address = AddressInput {
        street: "12 Rizal Ave".to_string(),
        city: String::new(),
        province: "Cebu".to_string(),
        postal_code: "6000".to_string(),
        country: "PH".to_string(),
    };

    check_address(&mut errors, "address", &address);

    let fields = error_fields(errors);
    assert!(fields.get("address.city").is_some());
    assert!(fields.get("address.street").is_none());
}
