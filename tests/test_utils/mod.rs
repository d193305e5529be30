//! Test utilities for database and HTTP testing.
//!
//! Sets up migrated in-memory SQLite databases, spawns the full router on a
//! random port and inserts the fixture rows most suites need.

#![allow(dead_code)]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

use school_admin::auth::issue_token;
use school_admin::config::AppConfig;
use school_admin::db::{init_pool, run_migrations};
use school_admin::models::{
    building, classroom, classtime, course, department, major, school_year, section, semester,
    student, teach, teacher, user,
};
use school_admin::permissions::Role;
use school_admin::repositories::{
    EnrollmentRepository, GroupRepository, NewUser, TeachRepository, UserRepository,
};
use school_admin::seeds::seed_roles;
use school_admin::server::{AppState, create_app};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const SCHOOL_YEAR: i32 = 2024;

/// Configuration for tests: in-memory database, fast password hashing and a
/// throwaway media directory.
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        password_iterations: 1,
        media_root: std::env::temp_dir()
            .join(format!("school-admin-tests-{}", uuid::Uuid::new_v4())),
        ..AppConfig::default()
    }
}

/// Sets up an in-memory SQLite database with all migrations and role groups.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = init_pool(&test_config()).await?;
    run_migrations(&db).await?;
    seed_roles(&db).await?;
    Ok(db)
}

pub struct TestServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl TestServerHandle {
    fn new(shutdown_tx: oneshot::Sender<()>, join_handle: JoinHandle<Result<()>>) -> Self {
        Self {
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        }
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.take() {
            let result = handle.await.context("server task join failed")?;
            result?;
        }

        Ok(())
    }
}

impl Drop for TestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A running application bound to a random local port.
pub struct TestApp {
    pub address: String,
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub client: reqwest::Client,
    pub handle: TestServerHandle,
}

impl TestApp {
    /// Absolute URL for a path under `/api/v1`.
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    /// Bearer token for `user`.
    pub fn token(&self, user: &user::Model) -> String {
        issue_token(&self.config, user).expect("token issues")
    }

    pub fn get(&self, path: &str, user: &user::Model) -> reqwest::RequestBuilder {
        self.client.get(self.api(path)).bearer_auth(self.token(user))
    }

    pub fn post(&self, path: &str, user: &user::Model) -> reqwest::RequestBuilder {
        self.client.post(self.api(path)).bearer_auth(self.token(user))
    }

    pub fn patch(&self, path: &str, user: &user::Model) -> reqwest::RequestBuilder {
        self.client.patch(self.api(path)).bearer_auth(self.token(user))
    }

    pub fn delete(&self, path: &str, user: &user::Model) -> reqwest::RequestBuilder {
        self.client.delete(self.api(path)).bearer_auth(self.token(user))
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await.expect("server shuts down");
        let _ = std::fs::remove_dir_all(&self.config.media_root);
    }
}

/// Spawns the full router against a fresh migrated database.
pub async fn spawn_test_app() -> TestApp {
    spawn_test_app_with(test_config()).await
}

pub async fn spawn_test_app_with(config: AppConfig) -> TestApp {
    let db = init_pool(&config).await.expect("Failed to init test DB");
    run_migrations(&db).await.expect("Failed to migrate test DB");
    seed_roles(&db).await.expect("Failed to seed roles");
    std::fs::create_dir_all(&config.media_root).expect("media root is writable");

    let app = create_app(AppState::new(config.clone(), db.clone()));

    // Bind to a random port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let address = format!("http://{}", addr);

    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let _ = ready_tx.send(());

        server.await.context("axum server error")
    });

    ready_rx.await.expect("server task to signal readiness");

    TestApp {
        address,
        db,
        config,
        client: reqwest::Client::new(),
        handle: TestServerHandle::new(shutdown_tx, server_task),
    }
}

/// Creates an active user belonging to the role groups given.
pub async fn create_user(db: &DatabaseConnection, username: &str, roles: &[Role]) -> user::Model {
    let users = UserRepository::new(db);
    let user = users
        .create_with_iterations(
            NewUser {
                username: username.to_string(),
                email: format!("{}@school.test", username),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                password: TEST_PASSWORD.to_string(),
                is_staff: false,
            },
            1,
        )
        .await
        .expect("user is created");

    let groups = GroupRepository::new(db);
    let mut group_ids = Vec::new();
    for role in roles {
        let group = groups
            .find_by_name(role.group_name())
            .await
            .unwrap()
            .expect("role groups are seeded");
        group_ids.push(group.id);
    }
    if !group_ids.is_empty() {
        users.add_groups(user.id, &group_ids).await.unwrap();
    }
    user
}

pub async fn create_admin(db: &DatabaseConnection) -> user::Model {
    create_user(db, "admin", &[Role::Admin]).await
}

pub async fn create_department(db: &DatabaseConnection, name: &str) -> department::Model {
    department::ActiveModel {
        name: Set(name.to_string()),
        budget: Set(100000.0),
        duty: Set(String::new()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_major(db: &DatabaseConnection, department_id: i32, name: &str) -> major::Model {
    major::ActiveModel {
        name: Set(name.to_string()),
        department_id: Set(department_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_classroom(db: &DatabaseConnection, name: &str) -> classroom::Model {
    let building = building::ActiveModel {
        name: Set(format!("{} Hall", name)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    classroom::ActiveModel {
        name: Set(name.to_string()),
        dimension: Set("10m x 8m".to_string()),
        building_id: Set(building.id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_classtime(db: &DatabaseConnection) -> classtime::Model {
    classtime::ActiveModel {
        start_time: Set("08:00AM".to_string()),
        end_time: Set("09:30AM".to_string()),
        week_days: Set("MWF".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_course(
    db: &DatabaseConnection,
    code: &str,
    department_id: i32,
    prerequisite_id: Option<i32>,
) -> course::Model {
    course::ActiveModel {
        code: Set(code.to_string()),
        title: Set(format!("{} course", code)),
        description: Set(String::new()),
        units: Set(3),
        department_id: Set(department_id),
        prerequisite_id: Set(prerequisite_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_section(
    db: &DatabaseConnection,
    course_id: i32,
    classroom_id: i32,
    classtime_id: i32,
    name: &str,
) -> section::Model {
    section::ActiveModel {
        name: Set(name.to_string()),
        course_id: Set(course_id),
        classroom_id: Set(classroom_id),
        classtime_id: Set(classtime_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn ensure_school_year(db: &DatabaseConnection, year: i32) {
    if school_year::Entity::find_by_id(year)
        .one(db)
        .await
        .unwrap()
        .is_none()
    {
        school_year::ActiveModel { year: Set(year) }
            .insert(db)
            .await
            .unwrap();
    }
}

pub async fn create_semester(
    db: &DatabaseConnection,
    year: i32,
    term: &str,
    is_current: bool,
) -> semester::Model {
    ensure_school_year(db, year).await;
    semester::ActiveModel {
        term: Set(term.to_string()),
        school_year: Set(year),
        is_current: Set(is_current),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn create_student(
    db: &DatabaseConnection,
    user_id: i32,
    major_id: i32,
    student_number: &str,
) -> student::Model {
    ensure_school_year(db, SCHOOL_YEAR).await;
    student::ActiveModel {
        user_id: Set(user_id),
        student_number: Set(student_number.to_string()),
        major_id: Set(major_id),
        year_level: Set(1),
        is_transfer_student: Set(false),
        admission_year: Set(SCHOOL_YEAR),
        phone: Set("+63 917 555 0101".to_string()),
        birth_date: Set(date(2004, 5, 17)),
        gender: Set("F".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_teacher(
    db: &DatabaseConnection,
    user_id: i32,
    department_id: i32,
) -> teacher::Model {
    teacher::ActiveModel {
        user_id: Set(user_id),
        department_id: Set(department_id),
        specialization: Set("Algorithms".to_string()),
        phone: Set("+63 917 555 0199".to_string()),
        birth_date: Set(date(1980, 1, 2)),
        gender: Set("M".to_string()),
        hire_date: Set(date(2010, 6, 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// The rows a typical scenario needs: one department and major, one course
/// with a section, and a current semester.
pub struct Campus {
    pub department: department::Model,
    pub major: major::Model,
    pub classroom: classroom::Model,
    pub classtime: classtime::Model,
    pub semester: semester::Model,
    pub course: course::Model,
    pub section: section::Model,
}

pub async fn seed_campus(db: &DatabaseConnection) -> Campus {
    let department = create_department(db, "Computer Science").await;
    let major = create_major(db, department.id, "Software Engineering").await;
    let classroom = create_classroom(db, "CS-101").await;
    let classtime = create_classtime(db).await;
    let semester = create_semester(db, SCHOOL_YEAR, "first", true).await;
    let course = create_course(db, "CS101", department.id, None).await;
    let section = create_section(db, course.id, classroom.id, classtime.id, "A").await;

    Campus {
        department,
        major,
        classroom,
        classtime,
        semester,
        course,
        section,
    }
}

/// Creates a student account with a profile in the campus major.
pub async fn enrolled_student(
    db: &DatabaseConnection,
    campus: &Campus,
    username: &str,
) -> (user::Model, student::Model) {
    let account = create_user(db, username, &[Role::Student]).await;
    let profile = create_student(db, account.id, campus.major.id, &format!("S-{}", username)).await;
    EnrollmentRepository::new(db, 75.0)
        .enroll(profile.id, campus.section.id)
        .await
        .expect("student enrolls");
    (account, profile)
}

/// Creates a teacher account assigned to the campus section this semester.
pub async fn assigned_teacher(
    db: &DatabaseConnection,
    campus: &Campus,
    username: &str,
) -> (user::Model, teacher::Model, teach::Model) {
    let account = create_user(db, username, &[Role::Teacher]).await;
    let profile = create_teacher(db, account.id, campus.department.id).await;
    let teach = TeachRepository::new(db)
        .create(profile.id, campus.section.id, Some(campus.semester.id))
        .await
        .expect("teacher is assigned");
    (account, profile, teach)
}
