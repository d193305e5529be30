//! Which courses a student may enroll in next.

use std::collections::HashSet;

use crate::models::course;

/// What a student has already done, by course id.
#[derive(Debug, Default, Clone)]
pub struct StudentHistory {
    /// Courses enrolled in during the current semester
    pub enrolled_current: HashSet<i32>,
    /// Courses with at least one passing grade
    pub passed: HashSet<i32>,
}

/// Reason a course is closed to a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    AlreadyEnrolled,
    AlreadyPassed,
    PrerequisiteNotPassed { prerequisite_id: i32 },
}

impl Ineligible {
    pub fn message(&self) -> String {
        match self {
            Ineligible::AlreadyEnrolled => {
                "Student is already enrolled in this course for the current semester".to_string()
            }
            Ineligible::AlreadyPassed => "Student has already passed this course".to_string(),
            Ineligible::PrerequisiteNotPassed { prerequisite_id } => format!(
                "Prerequisite course {} has not been passed",
                prerequisite_id
            ),
        }
    }
}

impl StudentHistory {
    pub fn check(&self, course: &course::Model) -> Result<(), Ineligible> {
        if self.enrolled_current.contains(&course.id) {
            return Err(Ineligible::AlreadyEnrolled);
        }
        if self.passed.contains(&course.id) {
            return Err(Ineligible::AlreadyPassed);
        }
        match course.prerequisite_id {
            Some(prerequisite_id) if !self.passed.contains(&prerequisite_id) => {
                Err(Ineligible::PrerequisiteNotPassed { prerequisite_id })
            }
            _ => Ok(()),
        }
    }

    /// Filters `courses` to the eligible ones, ordered by course code.
    pub fn eligible(&self, courses: Vec<course::Model>) -> Vec<course::Model> {
        let mut eligible: Vec<_> = courses
            .into_iter()
            .filter(|course| self.check(course).is_ok())
            .collect();
        eligible.sort_by(|a, b| a.code.cmp(&b.code));
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: i32, code: &str, prerequisite_id: Option<i32>) -> course::Model {
        let now = chrono::Utc::now().into();
        course::Model {
            id,
            code: code.to_string(),
            title: code.to_string(),
            description: String::new(),
            units: 3,
            department_id: 1,
            prerequisite_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fresh_student_sees_only_courses_without_prerequisites() {
        let history = StudentHistory::default();
        let result = history.eligible(vec![
            course(2, "MATH102", Some(1)),
            course(1, "MATH101", None),
            course(3, "ENG101", None),
        ]);
        let codes: Vec<_> = result.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["ENG101", "MATH101"]);
    }

    #[test]
    fn passing_a_prerequisite_unlocks_the_next_course() {
        let history = StudentHistory {
            passed: HashSet::from([1]),
            ..Default::default()
        };
        let result = history.eligible(vec![course(1, "MATH101", None), course(2, "MATH102", Some(1))]);
        let codes: Vec<_> = result.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["MATH102"]);
    }

    #[test]
    fn current_enrollments_are_excluded() {
        let history = StudentHistory {
            enrolled_current: HashSet::from([3]),
            ..Default::default()
        };
        assert_eq!(
            history.check(&course(3, "ENG101", None)),
            Err(Ineligible::AlreadyEnrolled)
        );
    }

    #[test]
    fn reports_missing_prerequisite() {
        let history = StudentHistory::default();
        let err = history.check(&course(2, "MATH102", Some(1))).unwrap_err();
        assert_eq!(err, Ineligible::PrerequisiteNotPassed { prerequisite_id: 1 });
        assert!(err.message().contains("Prerequisite course 1"));
    }
}
