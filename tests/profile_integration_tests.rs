//! Integration tests for teacher and student profiles, teaching assignments
//! and media uploads.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use school_admin::permissions::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    create_admin, create_student, create_teacher, create_user, seed_campus, spawn_test_app,
};

fn address() -> Value {
    json!({
        "street": "12 Rizal Ave",
        "city": "Cebu City",
        "province": "Cebu",
        "postal_code": "6000",
        "country": "Philippines",
    })
}

#[tokio::test]
async fn test_admin_creates_teacher_with_address() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let account = create_user(&app.db, "mreyes", &[Role::Teacher]).await;

    let response = app
        .post("/teachers", &admin)
        .json(&json!({
            "user_id": account.id,
            "department_id": campus.department.id,
            "specialization": "Databases",
            "phone": "+63 917 555 0123",
            "birth_date": "1985-03-14",
            "gender": "F",
            "hire_date": "2012-06-01",
            "address": address(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let teacher: Value = response.json().await.unwrap();
    assert_eq!(teacher["specialization"], "Databases");
    assert_eq!(teacher["address"]["city"], "Cebu City");

    let response = app
        .patch(&format!("/teachers/{}", teacher["id"]), &admin)
        .json(&json!({ "specialization": "Distributed Systems" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["specialization"], "Distributed Systems");
    assert_eq!(updated["address"]["id"], teacher["address"]["id"]);

    app.shutdown().await;
}

#[tokio::test]
async fn test_teacher_profile_validation() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;

    let response = app
        .post("/teachers", &admin)
        .json(&json!({
            "user_id": 9999,
            "department_id": campus.department.id,
            "specialization": "Databases",
            "phone": "call me",
            "birth_date": "1990-01-01",
            "gender": "Q",
            "hire_date": "1989-01-01",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    for field in ["user_id", "phone", "gender", "hire_date"] {
        assert!(body["details"].get(field).is_some(), "missing error for {field}");
    }

    app.shutdown().await;
}

#[tokio::test]
async fn test_teaching_assignment_defaults_to_current_semester() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let account = create_user(&app.db, "teacher", &[Role::Teacher]).await;
    let teacher = create_teacher(&app.db, account.id, campus.department.id).await;
    let path = format!("/teachers/{}/teaches", teacher.id);

    // Teachers cannot assign themselves.
    let response = app
        .post(&path, &account)
        .json(&json!({ "section_id": campus.section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post(&path, &admin)
        .json(&json!({ "section_id": campus.section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let teach: Value = response.json().await.unwrap();
    assert_eq!(teach["semester_id"], campus.semester.id);
    assert_eq!(teach["course_id"], campus.course.id);

    // One teacher per section and semester.
    let response = app
        .post(&path, &admin)
        .json(&json!({ "section_id": campus.section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.get(&path, &account).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let teaches: Value = response.json().await.unwrap();
    assert_eq!(teaches.as_array().unwrap().len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_registrar_manages_students() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let registrar = create_user(&app.db, "registrar", &[Role::Registrar]).await;
    let account = create_user(&app.db, "pupil", &[Role::Student]).await;
    let payload = json!({
        "user_id": account.id,
        "student_number": "2024-00123",
        "major_id": campus.major.id,
        "year_level": 1,
        "admission_year": campus.semester.school_year,
        "phone": "+63 917 555 0144",
        "birth_date": "2005-09-30",
        "gender": "M",
    });

    let response = app.post("/students", &account).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut invalid = payload.clone();
    invalid["year_level"] = json!(7);
    let response = app.post("/students", &registrar).json(&invalid).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("year_level").is_some());

    let response = app.post("/students", &registrar).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let student: Value = response.json().await.unwrap();
    assert_eq!(student["student_number"], "2024-00123");
    assert!(student["address"].is_null());

    let response = app
        .get(&format!("/students?major_id={}", campus.major.id), &account)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_student_image_upload_is_stored_under_media_root() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let registrar = create_user(&app.db, "registrar", &[Role::Registrar]).await;
    let account = create_user(&app.db, "pupil", &[Role::Student]).await;
    let student = create_student(&app.db, account.id, campus.major.id, "2024-00124").await;
    let path = format!("/students/{}/image", student.id);

    let form = Form::new().part(
        "file",
        Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec()).file_name("portrait.PNG"),
    );
    let response = app.post(&path, &registrar).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let stored = format!("school/images/{}.png", account.id);
    assert_eq!(body["image"], stored);
    assert!(app.config.media_root.join(&stored).exists());

    let form = Form::new().part("file", Part::bytes(b"MZ".to_vec()).file_name("virus.exe"));
    let response = app.post(&path, &registrar).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNSUPPORTED_FILE_TYPE");

    let response = app
        .post(&path, &registrar)
        .multipart(Form::new().text("caption", "no file"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.shutdown().await;
}
