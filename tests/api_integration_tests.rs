//! Integration tests for authentication, access policies and the catalogue
//! endpoints (organization and curriculum).

use reqwest::StatusCode;
use serde_json::{Value, json};

use school_admin::permissions::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    SCHOOL_YEAR, TEST_PASSWORD, create_admin, create_course, create_department, create_semester,
    create_user, spawn_test_app,
};

#[tokio::test]
async fn test_public_endpoints_no_auth_required() {
    let app = spawn_test_app().await;

    let response = app.client.get(format!("{}/", app.address)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["service"], "school-admin");

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["database"], "ok");

    app.shutdown().await;
}

#[tokio::test]
async fn test_openapi_document_lists_routes_and_bearer_scheme() {
    let app = spawn_test_app().await;

    let response = app
        .client
        .get(format!("{}/openapi.json", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let spec: Value = response.json().await.unwrap();
    assert!(spec["paths"].get("/api/v1/courses").is_some());
    assert!(
        spec["paths"]
            .get("/api/v1/teachers/{id}/teaches/{teach_id}/grades")
            .is_some()
    );
    assert!(spec["components"]["securitySchemes"].get("bearer_auth").is_some());

    app.shutdown().await;
}

#[tokio::test]
async fn test_responses_carry_trace_id_header() {
    let app = spawn_test_app().await;

    let response = app.client.get(format!("{}/", app.address)).send().await.unwrap();
    assert!(response.headers().get("x-trace-id").is_some());

    app.shutdown().await;
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_test_app().await;

    let response = app.client.get(app.api("/departments")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let response = app
        .client
        .get(app.api("/departments"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .get(app.api("/departments"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.shutdown().await;
}

#[tokio::test]
async fn test_register_then_login_then_me() {
    let app = spawn_test_app().await;

    let response = app
        .client
        .post(app.api("/auth/users"))
        .json(&json!({
            "username": "jdoe",
            "email": "jdoe@school.test",
            "first_name": "Jane",
            "last_name": "Doe",
            "password": TEST_PASSWORD,
            "confirm_password": TEST_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["username"], "jdoe");
    assert!(created.get("password_hash").is_none());

    let response = app
        .client
        .post(app.api("/auth/jwt/create"))
        .json(&json!({ "username": "jdoe", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .post(app.api("/auth/jwt/create"))
        .json(&json!({ "username": "jdoe", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token: Value = response.json().await.unwrap();
    assert_eq!(token["token_type"], "Bearer");
    let access = token["access"].as_str().unwrap().to_string();

    let response = app
        .client
        .get(app.api("/auth/users/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["username"], "jdoe");
    assert_eq!(me["groups"], json!([]));

    app.shutdown().await;
}

#[tokio::test]
async fn test_registration_validates_fields() {
    let app = spawn_test_app().await;

    let response = app
        .client
        .post(app.api("/auth/users"))
        .json(&json!({
            "username": "bad name!",
            "email": "not-an-email",
            "first_name": "Jane",
            "last_name": "Doe",
            "password": "12345678",
            "confirm_password": "87654321",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    for field in ["username", "email", "password", "confirm_password"] {
        assert!(body["details"].get(field).is_some(), "missing error for {field}");
    }

    app.shutdown().await;
}

#[tokio::test]
async fn test_user_listing_is_admin_only() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;
    let student = create_user(&app.db, "pupil", &[Role::Student]).await;

    let response = app.get("/auth/users", &student).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/auth/users", &admin).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    // Students may read their own account but nobody else's.
    let response = app
        .get(&format!("/auth/users/{}", admin.id), &student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get(&format!("/auth/users/{}", student.id), &student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["groups"][0]["name"], "Student");

    app.shutdown().await;
}

#[tokio::test]
async fn test_department_writes_need_admin() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;
    let registrar = create_user(&app.db, "registrar", &[Role::Registrar]).await;
    let payload = json!({ "name": "Mathematics", "budget": 50000.5, "duty": "Teach math" });

    let response = app
        .post("/departments", &registrar)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post("/departments", &admin).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let department: Value = response.json().await.unwrap();
    assert_eq!(department["name"], "Mathematics");

    // Reads are open to any authenticated caller.
    let response = app.get("/departments", &registrar).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list: Value = response.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let response = app.post("/departments", &admin).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.shutdown().await;
}

#[tokio::test]
async fn test_department_budget_is_validated() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;

    let response = app
        .post("/departments", &admin)
        .json(&json!({ "name": "Physics", "budget": 1000000.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("budget").is_some());

    let response = app
        .get("/departments/999", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}

#[tokio::test]
async fn test_classtime_rejects_end_before_start() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;

    let response = app
        .post("/classtimes", &admin)
        .json(&json!({ "start_time": "10:00AM", "end_time": "09:00AM", "week_days": "MWF" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/classtimes", &admin)
        .json(&json!({ "start_time": "10:00AM", "end_time": "11:30AM", "week_days": "TH" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    app.shutdown().await;
}

#[tokio::test]
async fn test_only_one_semester_is_current() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;
    let first = create_semester(&app.db, SCHOOL_YEAR, "first", true).await;

    let response = app.get("/semesters/current", &admin).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let current: Value = response.json().await.unwrap();
    assert_eq!(current["id"], first.id);

    let response = app
        .post("/semesters", &admin)
        .json(&json!({ "term": "second", "school_year": SCHOOL_YEAR, "is_current": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let second: Value = response.json().await.unwrap();

    let response = app.get("/semesters/current", &admin).send().await.unwrap();
    let current: Value = response.json().await.unwrap();
    assert_eq!(current["id"], second["id"]);

    let response = app
        .get(&format!("/semesters/{}", first.id), &admin)
        .send()
        .await
        .unwrap();
    let first_now: Value = response.json().await.unwrap();
    assert_eq!(first_now["is_current"], false);

    app.shutdown().await;
}

#[tokio::test]
async fn test_semester_needs_existing_year_and_known_term() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;

    let response = app
        .post("/semesters", &admin)
        .json(&json!({ "term": "winter", "school_year": 1999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("term").is_some());
    assert!(body["details"].get("school_year").is_some());

    app.shutdown().await;
}

#[tokio::test]
async fn test_course_listing_filters_and_paginates() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;
    let cs = create_department(&app.db, "Computer Science").await;
    let math = create_department(&app.db, "Mathematics").await;
    let intro = create_course(&app.db, "CS101", cs.id, None).await;
    create_course(&app.db, "CS102", cs.id, Some(intro.id)).await;
    create_course(&app.db, "CS103", cs.id, Some(intro.id)).await;
    create_course(&app.db, "MATH101", math.id, None).await;

    let response = app
        .get(&format!("/courses?department_id={}", math.id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["code"], "MATH101");

    let response = app
        .get(&format!("/courses?prerequisite={}&limit=1", intro.id), &admin)
        .send()
        .await
        .unwrap();
    let first_page: Value = response.json().await.unwrap();
    assert_eq!(first_page["data"][0]["code"], "CS102");
    let cursor = first_page["next_cursor"].as_str().expect("more pages").to_string();

    let response = app
        .get(
            &format!("/courses?prerequisite={}&limit=1&cursor={}", intro.id, cursor),
            &admin,
        )
        .send()
        .await
        .unwrap();
    let second_page: Value = response.json().await.unwrap();
    assert_eq!(second_page["data"][0]["code"], "CS103");
    assert!(second_page["next_cursor"].is_null());

    let response = app
        .get("/courses?limit=0", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.shutdown().await;
}

#[tokio::test]
async fn test_course_validation_and_prerequisite_clearing() {
    let app = spawn_test_app().await;
    let admin = create_admin(&app.db).await;
    let cs = create_department(&app.db, "Computer Science").await;
    let intro = create_course(&app.db, "CS101", cs.id, None).await;

    let response = app
        .post("/courses", &admin)
        .json(&json!({
            "code": "CS999",
            "title": "Too heavy",
            "units": 9,
            "department_id": 4242,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("units").is_some());
    assert_eq!(
        body["details"]["department_id"],
        "Invalid pk \"4242\" - object does not exist."
    );

    let response = app
        .post("/courses", &admin)
        .json(&json!({
            "code": "CS201",
            "title": "Data Structures",
            "units": 3,
            "department_id": cs.id,
            "prerequisite_id": intro.id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let course: Value = response.json().await.unwrap();
    assert_eq!(course["prerequisite_id"], intro.id);

    let response = app
        .patch(&format!("/courses/{}", course["id"]), &admin)
        .json(&json!({ "prerequisite_id": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert!(updated["prerequisite_id"].is_null());
    assert_eq!(updated["title"], "Data Structures");

    app.shutdown().await;
}
