//! # Grade Upload
//!
//! Spreadsheet grade ingestion. A teacher uploads one `.xlsx` sheet per
//! taught section; the sheet must cover exactly the students enrolled in that
//! section for the teach's semester, and all rows are written or none are.

pub mod sheet;

use std::collections::BTreeSet;

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::error::{ApiError, payload_too_large};

pub use sheet::{GradeRow, HEADER_ROWS, SCORE_COLUMNS, parse_grade_rows, read_first_worksheet};

pub const SHEET_EXTENSION: &str = "xlsx";

#[derive(Debug, Error)]
pub enum GradeUploadError {
    #[error("teacher {0} not found")]
    TeacherNotFound(i32),
    #[error("teach {0} not found for this teacher")]
    TeachNotFound(i32),
    #[error("section {0} not found")]
    SectionNotFound(i32),
    #[error("no grade sheet was submitted")]
    MissingFile,
    #[error("grade sheet must be an .xlsx file")]
    NotXlsx,
    #[error("grade sheet exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error("grade sheet could not be read: {0}")]
    Unreadable(String),
    #[error("invalid grade sheet: {message}")]
    InvalidSheet {
        row: Option<usize>,
        message: String,
    },
    #[error("unknown student ids: {0:?}")]
    StudentNotFound(Vec<i32>),
    #[error("grade sheet does not match the section roster")]
    RosterMismatch {
        missing: Vec<i32>,
        unexpected: Vec<i32>,
    },
    #[error("grades already exist for this section and semester")]
    AlreadyGraded,
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl GradeUploadError {
    pub fn invalid_sheet(row: Option<usize>, message: impl Into<String>) -> Self {
        Self::InvalidSheet {
            row,
            message: message.into(),
        }
    }
}

impl From<GradeUploadError> for ApiError {
    fn from(error: GradeUploadError) -> Self {
        let message = error.to_string();
        match error {
            GradeUploadError::TeacherNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "TEACHER_NOT_FOUND", message)
            }
            GradeUploadError::TeachNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "TEACH_NOT_FOUND", message)
            }
            GradeUploadError::SectionNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "SECTION_NOT_FOUND", message)
            }
            GradeUploadError::MissingFile | GradeUploadError::NotXlsx => {
                ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message.clone())
                    .with_details(json!({ "file": message }))
            }
            GradeUploadError::TooLarge { limit } => payload_too_large(limit),
            GradeUploadError::Unreadable(reason) => {
                tracing::warn!(%reason, "Unreadable grade sheet");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GRADE_SHEET_UNREADABLE",
                    "Grade sheet could not be opened",
                )
            }
            GradeUploadError::InvalidSheet { row, .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_GRADE_SHEET", message)
                    .with_details(json!({ "row": row }))
            }
            GradeUploadError::StudentNotFound(ids) => {
                ApiError::new(StatusCode::NOT_FOUND, "STUDENT_NOT_FOUND", message)
                    .with_details(json!({ "student_ids": ids }))
            }
            GradeUploadError::RosterMismatch {
                missing,
                unexpected,
            } => ApiError::new(StatusCode::BAD_REQUEST, "ROSTER_MISMATCH", message)
                .with_details(json!({ "missing": missing, "unexpected": unexpected })),
            GradeUploadError::AlreadyGraded => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            GradeUploadError::Database(err) => err.into(),
        }
    }
}

/// Checks the uploaded file's name and size before it is parsed.
pub fn check_upload(
    file_name: Option<&str>,
    size: usize,
    limit: usize,
) -> Result<(), GradeUploadError> {
    let file_name = file_name.ok_or(GradeUploadError::MissingFile)?;
    if crate::media::file_extension(file_name).as_deref() != Some(SHEET_EXTENSION) {
        return Err(GradeUploadError::NotXlsx);
    }
    if size > limit {
        return Err(GradeUploadError::TooLarge { limit });
    }
    Ok(())
}

/// The sheet must list exactly the enrolled students.
pub fn compare_roster(
    sheet: &BTreeSet<i32>,
    roster: &BTreeSet<i32>,
) -> Result<(), GradeUploadError> {
    let missing: Vec<i32> = roster.difference(sheet).copied().collect();
    let unexpected: Vec<i32> = sheet.difference(roster).copied().collect();
    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }
    Err(GradeUploadError::RosterMismatch {
        missing,
        unexpected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_checks() {
        assert!(matches!(
            check_upload(None, 10, 100),
            Err(GradeUploadError::MissingFile)
        ));
        assert!(matches!(
            check_upload(Some("grades.csv"), 10, 100),
            Err(GradeUploadError::NotXlsx)
        ));
        assert!(matches!(
            check_upload(Some("grades.XLSX"), 101, 100),
            Err(GradeUploadError::TooLarge { limit: 100 })
        ));
        assert!(check_upload(Some("grades.xlsx"), 100, 100).is_ok());
    }

    #[test]
    fn roster_must_match_exactly() {
        let roster = BTreeSet::from([1, 2, 3]);
        assert!(compare_roster(&BTreeSet::from([3, 2, 1]), &roster).is_ok());

        match compare_roster(&BTreeSet::from([1, 2, 9]), &roster).unwrap_err() {
            GradeUploadError::RosterMismatch {
                missing,
                unexpected,
            } => {
                assert_eq!(missing, vec![3]);
                assert_eq!(unexpected, vec![9]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_codes() {
        let cases: Vec<(GradeUploadError, StatusCode, &str)> = vec![
            (GradeUploadError::TeacherNotFound(1), StatusCode::NOT_FOUND, "TEACHER_NOT_FOUND"),
            (GradeUploadError::TeachNotFound(1), StatusCode::NOT_FOUND, "TEACH_NOT_FOUND"),
            (GradeUploadError::SectionNotFound(1), StatusCode::NOT_FOUND, "SECTION_NOT_FOUND"),
            (
                GradeUploadError::Unreadable("zip".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "GRADE_SHEET_UNREADABLE",
            ),
            (
                GradeUploadError::invalid_sheet(Some(6), "bad"),
                StatusCode::BAD_REQUEST,
                "INVALID_GRADE_SHEET",
            ),
            (
                GradeUploadError::StudentNotFound(vec![5]),
                StatusCode::NOT_FOUND,
                "STUDENT_NOT_FOUND",
            ),
            (GradeUploadError::AlreadyGraded, StatusCode::CONFLICT, "CONFLICT"),
        ];

        for (error, status, code) in cases {
            let api: ApiError = error.into();
            assert_eq!(api.status, status);
            assert_eq!(api.code, Box::from(code));
        }
    }
}
