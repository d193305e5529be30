//! Grade sheet parsing.
//!
//! Sheet layout, one sheet per section:
//!
//! | row | content                                  |
//! |-----|------------------------------------------|
//! | 1   | semester                                 |
//! | 2   | school year                              |
//! | 3   | course                                   |
//! | 4   | section                                  |
//! | 5   | column headers                           |
//! | 6.. | student id, quiz, assignment, attendance, project, midterm exam, final exam |

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};

use super::GradeUploadError;

/// Leading rows carrying sheet metadata rather than grades.
pub const HEADER_ROWS: usize = 5;

pub const SCORE_COLUMNS: [&str; 6] = [
    "quiz",
    "assignment",
    "attendance",
    "project",
    "midterm_exam",
    "final_exam",
];

/// One student's scores, tagged with its 1-based sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub row: usize,
    pub student_id: i32,
    pub scores: [f64; 6],
}

/// Reads the first worksheet into a grid anchored at cell A1.
pub fn read_first_worksheet(bytes: &[u8]) -> Result<Vec<Vec<Data>>, GradeUploadError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|err: calamine::XlsxError| GradeUploadError::Unreadable(err.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GradeUploadError::Unreadable("workbook has no worksheets".to_string()))?
        .map_err(|err| GradeUploadError::Unreadable(err.to_string()))?;

    // calamine ranges start at the first used cell; pad back to A1.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut grid: Vec<Vec<Data>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; start_col as usize];
        cells.extend(row.iter().cloned());
        grid.push(cells);
    }
    Ok(grid)
}

/// Parses the grade rows below the header block.
pub fn parse_grade_rows(grid: &[Vec<Data>]) -> Result<Vec<GradeRow>, GradeUploadError> {
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for (index, cells) in grid.iter().enumerate().skip(HEADER_ROWS) {
        let row = index + 1;
        if cells.iter().all(is_blank) {
            continue;
        }

        let student_id = parse_student_id(cells.first(), row)?;
        if !seen.insert(student_id) {
            return Err(GradeUploadError::invalid_sheet(
                Some(row),
                format!("student {} appears more than once", student_id),
            ));
        }

        let mut scores = [0.0; 6];
        for (offset, name) in SCORE_COLUMNS.iter().enumerate() {
            scores[offset] = parse_score(cells.get(offset + 1), name, row)?;
        }

        rows.push(GradeRow {
            row,
            student_id,
            scores,
        });
    }

    if rows.is_empty() {
        return Err(GradeUploadError::invalid_sheet(
            None,
            "sheet contains no grade rows",
        ));
    }

    Ok(rows)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_student_id(cell: Option<&Data>, row: usize) -> Result<i32, GradeUploadError> {
    let invalid = || GradeUploadError::invalid_sheet(Some(row), "student id must be a positive integer");

    let id = match cell {
        Some(Data::Int(value)) => i32::try_from(*value).map_err(|_| invalid())?,
        Some(Data::Float(value)) if value.fract() == 0.0 => {
            if *value < 1.0 || *value > f64::from(i32::MAX) {
                return Err(invalid());
            }
            *value as i32
        }
        Some(Data::String(value)) => value.trim().parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if id < 1 {
        return Err(invalid());
    }
    Ok(id)
}

fn parse_score(cell: Option<&Data>, column: &str, row: usize) -> Result<f64, GradeUploadError> {
    let value = match cell {
        Some(Data::Int(value)) => *value as f64,
        Some(Data::Float(value)) => *value,
        Some(Data::String(value)) => value.trim().parse().map_err(|_| {
            GradeUploadError::invalid_sheet(Some(row), format!("{} must be a number", column))
        })?,
        _ => {
            return Err(GradeUploadError::invalid_sheet(
                Some(row),
                format!("{} is missing", column),
            ));
        }
    };

    crate::validators::score(value)
        .map_err(|message| GradeUploadError::invalid_sheet(Some(row), format!("{}: {}", column, message)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<Vec<Data>> {
        vec![
            vec![Data::String("first".into())],
            vec![Data::String("2024".into())],
            vec![Data::String("MATH101".into())],
            vec![Data::String("A".into())],
            std::iter::once("student_id")
                .chain(SCORE_COLUMNS)
                .map(|name| Data::String(name.to_string()))
                .collect(),
        ]
    }

    fn row(id: Data, scores: [f64; 6]) -> Vec<Data> {
        std::iter::once(id)
            .chain(scores.into_iter().map(Data::Float))
            .collect()
    }

    #[test]
    fn parses_rows_after_header() {
        let mut grid = header();
        grid.push(row(Data::Float(4.0), [90.0, 85.0, 100.0, 80.0, 70.0, 75.0]));
        grid.push(vec![Data::Empty; 7]);
        grid.push(row(Data::Int(9), [50.0; 6]));

        let rows = parse_grade_rows(&grid).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 6);
        assert_eq!(rows[0].student_id, 4);
        assert_eq!(rows[0].scores[2], 100.0);
        assert_eq!(rows[1].row, 8);
        assert_eq!(rows[1].student_id, 9);
    }

    #[test]
    fn accepts_textual_numbers() {
        let mut grid = header();
        let mut cells = vec![Data::String(" 12 ".into())];
        cells.extend((0..6).map(|_| Data::String("88.5".into())));
        grid.push(cells);

        let rows = parse_grade_rows(&grid).unwrap();
        assert_eq!(rows[0].student_id, 12);
        assert_eq!(rows[0].scores, [88.5; 6]);
    }

    #[test]
    fn rejects_out_of_range_score_with_row_number() {
        let mut grid = header();
        grid.push(row(Data::Int(1), [90.0, 85.0, 100.0, 80.0, 170.0, 75.0]));

        match parse_grade_rows(&grid).unwrap_err() {
            GradeUploadError::InvalidSheet { row, message } => {
                assert_eq!(row, Some(6));
                assert!(message.starts_with("midterm_exam"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_scores() {
        let mut grid = header();
        grid.push(vec![Data::Int(1), Data::Float(90.0)]);
        assert!(matches!(
            parse_grade_rows(&grid),
            Err(GradeUploadError::InvalidSheet { row: Some(6), .. })
        ));
    }

    #[test]
    fn rejects_duplicate_students() {
        let mut grid = header();
        grid.push(row(Data::Int(1), [80.0; 6]));
        grid.push(row(Data::Int(1), [70.0; 6]));
        assert!(matches!(
            parse_grade_rows(&grid),
            Err(GradeUploadError::InvalidSheet { row: Some(7), .. })
        ));
    }

    #[test]
    fn rejects_bad_student_id() {
        let mut grid = header();
        grid.push(row(Data::Float(2.5), [80.0; 6]));
        assert!(matches!(
            parse_grade_rows(&grid),
            Err(GradeUploadError::InvalidSheet { row: Some(6), .. })
        ));
    }

    #[test]
    fn rejects_sheet_without_rows() {
        assert!(matches!(
            parse_grade_rows(&header()),
            Err(GradeUploadError::InvalidSheet { row: None, .. })
        ));
    }

    #[test]
    fn reads_workbook_padded_to_a1() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(5, 2, "only cell").unwrap();
        worksheet.write_number(6, 1, 7.0).unwrap();
        worksheet.write_number(6, 2, 80.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let grid = read_first_worksheet(&bytes).unwrap();
        assert_eq!(grid.len(), 7);
        assert!(grid[..5].iter().all(|row| row.is_empty()));
        assert_eq!(grid[5][2], Data::String("only cell".into()));
        assert_eq!(grid[6], vec![Data::Empty, Data::Float(7.0), Data::Float(80.0)]);
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        assert!(matches!(
            read_first_worksheet(b"definitely not a zip archive"),
            Err(GradeUploadError::Unreadable(_))
        ));
    }
}
