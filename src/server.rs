//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document for the School
//! Administration API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::media::MediaStore;
use crate::telemetry::{TRACE_ID_HEADER, trace_id_middleware};

/// Headroom above the upload limit for multipart boundaries and form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let media = MediaStore::new(config.media_root.clone(), config.max_upload_bytes);
        Self {
            config: Arc::new(config),
            db,
            media,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::auth::router())
        .merge(handlers::groups::router())
        .merge(handlers::organization::router())
        .merge(handlers::curriculum::router())
        .merge(handlers::staff::router())
        .merge(handlers::grades::router())
        .merge(handlers::students::router())
        .merge(handlers::attendance::router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(trace_id_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([TRACE_ID_HEADER.clone()]);

    if config.cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media_root.display()))?;

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health,
        handlers::auth::create_token,
        handlers::auth::register_user,
        handlers::auth::list_users,
        handlers::auth::me,
        handlers::auth::get_user,
        handlers::auth::update_user,
        handlers::auth::add_user_groups,
        handlers::groups::list_groups,
        handlers::groups::create_group,
        handlers::groups::get_group,
        handlers::groups::update_group,
        handlers::groups::delete_group,
        handlers::groups::add_users,
        handlers::groups::remove_users,
        handlers::groups::set_permissions,
        handlers::groups::list_permissions,
        handlers::groups::get_permission,
        handlers::organization::list_departments,
        handlers::organization::create_department,
        handlers::organization::get_department,
        handlers::organization::update_department,
        handlers::organization::delete_department,
        handlers::organization::get_department_address,
        handlers::organization::put_department_address,
        handlers::organization::delete_department_address,
        handlers::organization::list_majors,
        handlers::organization::create_major,
        handlers::organization::get_major,
        handlers::organization::update_major,
        handlers::organization::delete_major,
        handlers::organization::list_buildings,
        handlers::organization::create_building,
        handlers::organization::get_building,
        handlers::organization::update_building,
        handlers::organization::delete_building,
        handlers::organization::get_building_address,
        handlers::organization::put_building_address,
        handlers::organization::delete_building_address,
        handlers::organization::list_offices,
        handlers::organization::create_office,
        handlers::organization::get_office,
        handlers::organization::update_office,
        handlers::organization::delete_office,
        handlers::organization::list_classrooms,
        handlers::organization::create_classroom,
        handlers::organization::get_classroom,
        handlers::organization::update_classroom,
        handlers::organization::delete_classroom,
        handlers::curriculum::list_years,
        handlers::curriculum::create_year,
        handlers::curriculum::get_year,
        handlers::curriculum::delete_year,
        handlers::curriculum::list_semesters,
        handlers::curriculum::create_semester,
        handlers::curriculum::current_semester,
        handlers::curriculum::get_semester,
        handlers::curriculum::update_semester,
        handlers::curriculum::delete_semester,
        handlers::curriculum::list_classtimes,
        handlers::curriculum::create_classtime,
        handlers::curriculum::get_classtime,
        handlers::curriculum::update_classtime,
        handlers::curriculum::delete_classtime,
        handlers::curriculum::list_courses,
        handlers::curriculum::create_course,
        handlers::curriculum::get_course,
        handlers::curriculum::update_course,
        handlers::curriculum::delete_course,
        handlers::curriculum::list_sections,
        handlers::curriculum::create_section,
        handlers::curriculum::get_section,
        handlers::curriculum::update_section,
        handlers::curriculum::delete_section,
        handlers::staff::list_employees,
        handlers::staff::create_employee,
        handlers::staff::get_employee,
        handlers::staff::update_employee,
        handlers::staff::delete_employee,
        handlers::staff::upload_employee_image,
        handlers::staff::list_teachers,
        handlers::staff::create_teacher,
        handlers::staff::get_teacher,
        handlers::staff::update_teacher,
        handlers::staff::delete_teacher,
        handlers::staff::upload_teacher_image,
        handlers::staff::list_teaches,
        handlers::staff::create_teach,
        handlers::staff::get_teach,
        handlers::staff::delete_teach,
        handlers::students::list_students,
        handlers::students::create_student,
        handlers::students::get_student,
        handlers::students::update_student,
        handlers::students::delete_student,
        handlers::students::upload_student_image,
        handlers::students::upload_student_tor,
        handlers::students::list_enrollments,
        handlers::students::create_enrollment,
        handlers::students::delete_enrollment,
        handlers::students::eligible_courses,
        handlers::students::list_student_grades,
        handlers::students::list_student_attendances,
        handlers::attendance::list_section_attendances,
        handlers::attendance::record_attendances,
        handlers::attendance::update_attendance,
        handlers::attendance::delete_attendance,
        handlers::grades::list_teach_grades,
        handlers::grades::upload_grades,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::AddressResponse,
            crate::handlers::types::DetailResponse,
            crate::repositories::AddressInput,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "auth", description = "Tokens, registration and user accounts"),
        (name = "groups", description = "Role groups and permissions"),
        (name = "organization", description = "Departments, majors, buildings, offices and classrooms"),
        (name = "curriculum", description = "School years, semesters, class times, courses and sections"),
        (name = "staff", description = "Employees, teachers and teaching assignments"),
        (name = "students", description = "Students, enrollments and eligibility"),
        (name = "attendance", description = "Section attendance"),
        (name = "grades", description = "Grade sheet uploads"),
    ),
    info(
        title = "School Administration API",
        description = "Administration backend for departments, courses, staff, students, enrollment, attendance and grades",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
