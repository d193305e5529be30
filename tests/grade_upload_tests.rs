//! Grade sheet uploads: request checks over HTTP and the all-or-nothing
//! import against the section roster.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use school_admin::grading::{GradeRow, GradeUploadError};
use school_admin::permissions::Role;
use school_admin::repositories::GradeRepository;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{
    Campus, assigned_teacher, create_admin, create_student, create_teacher, create_user,
    enrolled_student, seed_campus, setup_test_db, spawn_test_app,
};

fn sheet_form(file_name: &str, bytes: Vec<u8>) -> Form {
    Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()))
}

/// Workbook with the five header rows filled in for the campus section.
fn grade_workbook(campus: &Campus) -> Workbook {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, &campus.semester.term).unwrap();
    sheet.write_number(1, 0, campus.semester.school_year as f64).unwrap();
    sheet.write_string(2, 0, &campus.course.code).unwrap();
    sheet.write_string(3, 0, &campus.section.name).unwrap();
    let columns = [
        "student_id",
        "quiz",
        "assignment",
        "attendance",
        "project",
        "midterm_exam",
        "final_exam",
    ];
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string(4, col as u16, *name).unwrap();
    }
    workbook
}

fn write_scores(sheet: &mut Worksheet, row: u32, student_id: i32, scores: [f64; 6]) {
    sheet.write_number(row, 0, student_id as f64).unwrap();
    for (offset, score) in scores.iter().enumerate() {
        sheet.write_number(row, offset as u16 + 1, *score).unwrap();
    }
}

fn row(row: usize, student_id: i32, score: f64) -> GradeRow {
    GradeRow {
        row,
        student_id,
        scores: [score; 6],
    }
}

#[tokio::test]
async fn test_upload_rejects_non_xlsx_files() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let (account, teacher, teach) = assigned_teacher(&app.db, &campus, "teacher").await;
    let path = format!("/teachers/{}/teaches/{}/grades", teacher.id, teach.id);

    let response = app
        .post(&path, &account)
        .multipart(sheet_form("grades.csv", b"id,quiz\n1,90\n".to_vec()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].get("file").is_some());

    let response = app
        .post(&path, &account)
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.shutdown().await;
}

#[tokio::test]
async fn test_upload_reports_unreadable_workbook() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let (account, teacher, teach) = assigned_teacher(&app.db, &campus, "teacher").await;

    let response = app
        .post(
            &format!("/teachers/{}/teaches/{}/grades", teacher.id, teach.id),
            &account,
        )
        .multipart(sheet_form("grades.xlsx", b"definitely not a zip archive".to_vec()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "GRADE_SHEET_UNREADABLE");

    app.shutdown().await;
}

#[tokio::test]
async fn test_upload_requires_owning_teacher() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let (_, teacher, teach) = assigned_teacher(&app.db, &campus, "owner").await;
    let other_account = create_user(&app.db, "other", &[Role::Teacher]).await;
    create_teacher(&app.db, other_account.id, campus.department.id).await;
    let student = create_user(&app.db, "pupil", &[Role::Student]).await;
    let path = format!("/teachers/{}/teaches/{}/grades", teacher.id, teach.id);

    let response = app
        .post(&path, &other_account)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post(&path, &student)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Ownership is checked before the target is looked up.
    let response = app
        .post(&format!("/teachers/{}/teaches/999/grades", teacher.id), &other_account)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app
        .post("/teachers/999/teaches/1/grades", &other_account)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reading grades is open to any authenticated caller.
    let response = app.get(&path, &student).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let grades: Value = response.json().await.unwrap();
    assert_eq!(grades, serde_json::json!([]));

    app.shutdown().await;
}

#[tokio::test]
async fn test_upload_to_unknown_teach_is_not_found() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let admin = create_admin(&app.db).await;
    let (_, teacher, _) = assigned_teacher(&app.db, &campus, "teacher").await;

    let response = app
        .post(&format!("/teachers/{}/teaches/999/grades", teacher.id), &admin)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TEACH_NOT_FOUND");

    let response = app
        .post("/teachers/999/teaches/1/grades", &admin)
        .multipart(sheet_form("grades.xlsx", vec![0u8; 16]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TEACHER_NOT_FOUND");

    app.shutdown().await;
}

#[tokio::test]
async fn test_owning_teacher_uploads_grade_sheet() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let (account, teacher, teach) = assigned_teacher(&app.db, &campus, "teacher").await;
    let (_, first) = enrolled_student(&app.db, &campus, "first").await;
    let (_, second) = enrolled_student(&app.db, &campus, "second").await;

    let mut workbook = grade_workbook(&campus);
    let sheet = workbook.worksheet_from_index(0).unwrap();
    write_scores(sheet, 5, second.id, [60.0, 70.0, 65.0, 55.0, 60.0, 50.0]);
    write_scores(sheet, 6, first.id, [90.0, 85.0, 100.0, 80.0, 70.0, 75.0]);
    let bytes = workbook.save_to_buffer().unwrap();

    let path = format!("/teachers/{}/teaches/{}/grades", teacher.id, teach.id);
    let response = app
        .post(&path, &account)
        .multipart(sheet_form("grades.xlsx", bytes))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let grades: Value = response.json().await.unwrap();
    let grades = grades.as_array().unwrap();
    assert_eq!(grades.len(), 2);
    assert_eq!(grades[0]["student_id"], first.id);
    assert_eq!(grades[0]["final_exam"], 75.0);
    let average = grades[0]["average"].as_f64().unwrap();
    assert!((average - 500.0 / 6.0).abs() < 1e-9);
    assert_eq!(grades[0]["passed"], true);
    assert_eq!(grades[1]["student_id"], second.id);
    assert_eq!(grades[1]["average"], 60.0);
    assert_eq!(grades[1]["passed"], false);

    let response = app.get(&path, &account).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Value = response.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);

    app.shutdown().await;
}

#[tokio::test]
async fn test_upload_reports_bad_cell_row() {
    let app = spawn_test_app().await;
    let campus = seed_campus(&app.db).await;
    let (account, teacher, teach) = assigned_teacher(&app.db, &campus, "teacher").await;
    let (_, first) = enrolled_student(&app.db, &campus, "first").await;
    let (_, second) = enrolled_student(&app.db, &campus, "second").await;

    let mut workbook = grade_workbook(&campus);
    let sheet = workbook.worksheet_from_index(0).unwrap();
    write_scores(sheet, 5, first.id, [90.0; 6]);
    write_scores(sheet, 6, second.id, [80.0; 6]);
    sheet.write_string(6, 3, "absent").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let path = format!("/teachers/{}/teaches/{}/grades", teacher.id, teach.id);
    let response = app
        .post(&path, &account)
        .multipart(sheet_form("grades.xlsx", bytes))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_GRADE_SHEET");
    assert_eq!(body["details"]["row"], 7);

    let response = app.get(&path, &account).send().await.unwrap();
    let listed: Value = response.json().await.unwrap();
    assert_eq!(listed, serde_json::json!([]));

    app.shutdown().await;
}

#[tokio::test]
async fn test_import_writes_every_row_for_the_roster() {
    let db = setup_test_db().await.unwrap();
    let campus = seed_campus(&db).await;
    let (_, teacher, teach) = assigned_teacher(&db, &campus, "teacher").await;
    let (_, first) = enrolled_student(&db, &campus, "first").await;
    let (_, second) = enrolled_student(&db, &campus, "second").await;

    let grades = GradeRepository::new(&db)
        .import(&teach, vec![row(6, second.id, 80.0), row(7, first.id, 70.0)])
        .await
        .unwrap();

    assert_eq!(grades.len(), 2);
    assert_eq!(grades[0].student_id, first.id);
    assert_eq!(grades[0].teacher_id, teacher.id);
    assert_eq!(grades[0].course_id, campus.course.id);
    assert_eq!(grades[0].semester_id, campus.semester.id);
    assert_eq!(grades[1].average(), 80.0);
}

#[tokio::test]
async fn test_import_rejects_unknown_students_before_roster_check() {
    let db = setup_test_db().await.unwrap();
    let campus = seed_campus(&db).await;
    let (_, _, teach) = assigned_teacher(&db, &campus, "teacher").await;
    let (_, enrolled) = enrolled_student(&db, &campus, "pupil").await;

    let err = GradeRepository::new(&db)
        .import(&teach, vec![row(6, enrolled.id, 90.0), row(7, 4242, 90.0)])
        .await
        .unwrap_err();

    match err {
        GradeUploadError::StudentNotFound(ids) => assert_eq!(ids, vec![4242]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_import_requires_exact_roster() {
    let db = setup_test_db().await.unwrap();
    let campus = seed_campus(&db).await;
    let (_, _, teach) = assigned_teacher(&db, &campus, "teacher").await;
    let (_, enrolled) = enrolled_student(&db, &campus, "enrolled").await;
    let (_, absent) = enrolled_student(&db, &campus, "absent").await;
    let outsider_account = create_user(&db, "outsider", &[Role::Student]).await;
    let outsider = create_student(&db, outsider_account.id, campus.major.id, "S-outsider").await;

    let err = GradeRepository::new(&db)
        .import(&teach, vec![row(6, enrolled.id, 90.0), row(7, outsider.id, 90.0)])
        .await
        .unwrap_err();

    match err {
        GradeUploadError::RosterMismatch {
            missing,
            unexpected,
        } => {
            assert_eq!(missing, vec![absent.id]);
            assert_eq!(unexpected, vec![outsider.id]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Nothing was written.
    let grades = GradeRepository::new(&db).list_for_teach(&teach).await.unwrap();
    assert!(grades.is_empty());
}

#[tokio::test]
async fn test_import_refuses_second_upload() {
    let db = setup_test_db().await.unwrap();
    let campus = seed_campus(&db).await;
    let (_, _, teach) = assigned_teacher(&db, &campus, "teacher").await;
    let (_, student) = enrolled_student(&db, &campus, "pupil").await;
    let repo = GradeRepository::new(&db);

    repo.import(&teach, vec![row(6, student.id, 88.0)])
        .await
        .unwrap();
    let err = repo
        .import(&teach, vec![row(6, student.id, 95.0)])
        .await
        .unwrap_err();

    assert!(matches!(err, GradeUploadError::AlreadyGraded));
    let grades = repo.list_for_teach(&teach).await.unwrap();
    assert_eq!(grades.len(), 1);
    assert_eq!(grades[0].quiz, 88.0);
}
