//! Integration tests for enrollment, course eligibility and attendance.

use reqwest::StatusCode;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde_json::{Value, json};

use school_admin::models::{grade, semester};
use school_admin::permissions::Role;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    Campus, SCHOOL_YEAR, assigned_teacher, create_admin, create_course, create_section,
    create_semester, create_student, create_user, enrolled_student, seed_campus, spawn_test_app,
};

/// Stores a campus course grade with `score` on every component.
async fn record_grade(
    db: &sea_orm::DatabaseConnection,
    campus: &Campus,
    teacher_id: i32,
    student_id: i32,
    semester: &semester::Model,
    score: f64,
) {
    grade::ActiveModel {
        student_id: Set(student_id),
        course_id: Set(campus.course.id),
        section_id: Set(campus.section.id),
        semester_id: Set(semester.id),
        school_year: Set(semester.school_year),
        teacher_id: Set(teacher_id),
        quiz: Set(score),
        assignment: Set(score),
        attendance: Set(score),
        project: Set(score),
        midterm_exam: Set(score),
        final_exam: Set(score),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_registrar_enrolls_student_once_per_semester() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let registrar = create_user(&app.db, "registrar", &[Role::Registrar]).await;
    let account = create_user(&app.db, "pupil", &[Role::Student]).await;
    let student = create_student(&app.db, account.id, campus.major.id, "2024-0001").await;
    let path = format!("/students/{}/enrollments", student.id);
    let payload = json!({ "section_id": campus.section.id });

    // Students cannot enroll themselves.
    let response = app.post(&path, &account).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post(&path, &registrar).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let enrollment: Value = response.json().await.unwrap();
    assert_eq!(enrollment["course_id"], campus.course.id);
    assert_eq!(enrollment["semester_id"], campus.semester.id);
    assert_eq!(enrollment["school_year"], campus.semester.school_year);

    let response = app.post(&path, &registrar).json(&payload).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.get(&path, &account).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"].as_array().unwrap().len(), 1);

    let response = app
        .delete(&format!("{}/{}", path, enrollment["id"]), &registrar)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.shutdown().await;
}

#[tokio::test]
async fn test_enrollment_needs_current_semester() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let account = create_user(&app.db, "pupil", &[Role::Student]).await;
    let student = create_student(&app.db, account.id, campus.major.id, "2024-0002").await;

    let mut semester = campus.semester.clone().into_active_model();
    semester.is_current = Set(false);
    semester.update(&app.db).await.unwrap();

    let response = app
        .post(&format!("/students/{}/enrollments", student.id), &admin)
        .json(&json!({ "section_id": campus.section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NO_CURRENT_SEMESTER");

    app.shutdown().await;
}

#[tokio::test]
async fn test_enrollment_rejects_unknown_section() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let account = create_user(&app.db, "pupil", &[Role::Student]).await;
    let student = create_student(&app.db, account.id, campus.major.id, "2024-0003").await;

    let response = app
        .post(&format!("/students/{}/enrollments", student.id), &admin)
        .json(&json!({ "section_id": 9999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("section_id").is_some());

    let response = app
        .post("/students/9999/enrollments", &admin)
        .json(&json!({ "section_id": campus.section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}

#[tokio::test]
async fn test_prerequisite_must_be_passed_first() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let advanced = create_course(&app.db, "CS201", campus.department.id, Some(campus.course.id)).await;
    let advanced_section = create_section(
        &app.db,
        advanced.id,
        campus.classroom.id,
        campus.classtime.id,
        "A",
    )
    .await;
    let (_, student) = enrolled_student(&app.db, &campus, "pupil").await;
    let path = format!("/students/{}/enrollments", student.id);

    let response = app
        .post(&path, &admin)
        .json(&json!({ "section_id": advanced_section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "COURSE_NOT_ELIGIBLE");
    assert_eq!(body["details"]["reason"], "prerequisite_not_passed");

    // A failing grade from an earlier semester does not unlock the next course.
    let (_, teacher, _) = assigned_teacher(&app.db, &campus, "teacher").await;
    let earlier = create_semester(&app.db, SCHOOL_YEAR - 1, "second", false).await;
    record_grade(&app.db, &campus, teacher.id, student.id, &earlier, 60.0).await;
    let response = app
        .post(&path, &admin)
        .json(&json!({ "section_id": advanced_section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    record_grade(&app.db, &campus, teacher.id, student.id, &campus.semester, 90.0).await;
    let response = app
        .post(&path, &admin)
        .json(&json!({ "section_id": advanced_section.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    app.shutdown().await;
}

#[tokio::test]
async fn test_eligible_courses_excludes_current_and_locked_courses() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    create_course(&app.db, "CS201", campus.department.id, Some(campus.course.id)).await;
    create_course(&app.db, "CS110", campus.department.id, None).await;
    let (account, student) = enrolled_student(&app.db, &campus, "pupil").await;

    let response = app
        .get(&format!("/students/{}/eligible-courses", student.id), &account)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let courses: Value = response.json().await.unwrap();
    let codes: Vec<&str> = courses
        .as_array()
        .unwrap()
        .iter()
        .map(|course| course["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["CS110"]);

    app.shutdown().await;
}

#[tokio::test]
async fn test_teacher_records_attendance_for_enrolled_students() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let teacher = create_user(&app.db, "teacher", &[Role::Teacher]).await;
    let (student_account, student) = enrolled_student(&app.db, &campus, "pupil").await;
    let outsider_account = create_user(&app.db, "outsider", &[Role::Student]).await;
    let outsider =
        create_student(&app.db, outsider_account.id, campus.major.id, "2024-0099").await;
    let path = format!("/sections/{}/attendances", campus.section.id);

    let response = app
        .post(&path, &student_account)
        .json(&json!([{ "student_id": student.id, "mark": "P" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post(&path, &teacher).json(&json!([])).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(&path, &teacher)
        .json(&json!([{ "student_id": student.id, "mark": "X" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("[0].mark").is_some());

    let response = app
        .post(&path, &teacher)
        .json(&json!([{ "student_id": outsider.id, "mark": "P" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "STUDENT_NOT_ENROLLED");

    let response = app
        .post(&path, &teacher)
        .json(&json!([{ "student_id": student.id, "mark": "T", "comment": "Ten minutes late" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created[0]["course_id"], campus.course.id);
    let attendance_id = created[0]["id"].clone();

    let response = app
        .patch(&format!("/attendances/{}", attendance_id), &teacher)
        .json(&json!({ "mark": "E" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["mark"], "E");
    assert_eq!(updated["comment"], "Ten minutes late");

    let response = app
        .get(&format!("/students/{}/attendances", student.id), &student_account)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"][0]["mark"], "E");

    app.shutdown().await;
}
