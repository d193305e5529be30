//! Teaching assignments, enrollments, attendance and grades.

use std::collections::{BTreeSet, HashSet};

use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::{Page, PageRequest, delete_required, fetch_page, find_required};
use crate::eligibility::{Ineligible, StudentHistory};
use crate::error::RepositoryError;
use crate::grading::{GradeRow, GradeUploadError};
use crate::models::{
    attendance, course, enrollment, grade, section, semester, student, teach, teacher,
};

async fn current_semester(db: &DatabaseConnection) -> Result<Option<semester::Model>, RepositoryError> {
    semester::Entity::find()
        .filter(semester::Column::IsCurrent.eq(true))
        .one(db)
        .await
        .map_err(RepositoryError::database_error)
}

/// Student ids enrolled in a section for a semester.
async fn section_roster(
    db: &DatabaseConnection,
    section_id: i32,
    semester_id: i32,
) -> Result<BTreeSet<i32>, DbErr> {
    Ok(enrollment::Entity::find()
        .select_only()
        .column(enrollment::Column::StudentId)
        .filter(enrollment::Column::SectionId.eq(section_id))
        .filter(enrollment::Column::SemesterId.eq(semester_id))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect())
}

pub struct TeachRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TeachRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_teacher(&self, teacher_id: i32) -> Result<Vec<teach::Model>, RepositoryError> {
        find_required::<teacher::Entity, _>(self.db, teacher_id, "Teacher").await?;
        teach::Entity::find()
            .filter(teach::Column::TeacherId.eq(teacher_id))
            .order_by_asc(teach::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Loads a teach only if it belongs to the teacher.
    pub async fn find_for_teacher(
        &self,
        teacher_id: i32,
        teach_id: i32,
    ) -> Result<Option<teach::Model>, RepositoryError> {
        teach::Entity::find_by_id(teach_id)
            .filter(teach::Column::TeacherId.eq(teacher_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Assigns a teacher to a section. The course comes from the section and
    /// the semester defaults to the current one.
    pub async fn create(
        &self,
        teacher_id: i32,
        section_id: i32,
        semester_id: Option<i32>,
    ) -> Result<teach::Model, RepositoryError> {
        find_required::<teacher::Entity, _>(self.db, teacher_id, "Teacher").await?;
        let section = find_required::<section::Entity, _>(self.db, section_id, "Section").await?;
        let semester = match semester_id {
            Some(id) => find_required::<semester::Entity, _>(self.db, id, "Semester").await?,
            None => current_semester(self.db).await?.ok_or_else(|| {
                RepositoryError::rejected("NO_CURRENT_SEMESTER", "No semester is marked current")
            })?,
        };

        let teach = teach::ActiveModel {
            teacher_id: Set(teacher_id),
            course_id: Set(section.course_id),
            section_id: Set(section.id),
            semester_id: Set(semester.id),
            school_year: Set(semester.school_year),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        tracing::info!(teach_id = teach.id, teacher_id, section_id, "Assigned teacher to section");
        Ok(teach)
    }

    pub async fn delete(&self, teacher_id: i32, teach_id: i32) -> Result<(), RepositoryError> {
        self.find_for_teacher(teacher_id, teach_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("Teach {} not found", teach_id)))?;
        delete_required::<teach::Entity, _>(self.db, teach_id, "Teach").await
    }
}

pub struct EnrollmentRepository<'a> {
    db: &'a DatabaseConnection,
    passing_grade: f64,
}

impl<'a> EnrollmentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, passing_grade: f64) -> Self {
        Self { db, passing_grade }
    }

    pub async fn list_for_student(
        &self,
        student_id: i32,
        page: PageRequest,
    ) -> Result<Page<enrollment::Model>, RepositoryError> {
        find_required::<student::Entity, _>(self.db, student_id, "Student").await?;
        let query = enrollment::Entity::find().filter(enrollment::Column::StudentId.eq(student_id));
        fetch_page(self.db, query, enrollment::Column::Id, page, |e| e.id).await
    }

    /// Current-semester enrollments and passed courses for a student.
    pub async fn history(
        &self,
        student_id: i32,
        current: Option<&semester::Model>,
    ) -> Result<StudentHistory, RepositoryError> {
        let enrolled_current: HashSet<i32> = match current {
            Some(semester) => enrollment::Entity::find()
                .select_only()
                .column(enrollment::Column::CourseId)
                .filter(enrollment::Column::StudentId.eq(student_id))
                .filter(enrollment::Column::SemesterId.eq(semester.id))
                .into_tuple::<i32>()
                .all(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .into_iter()
                .collect(),
            None => HashSet::new(),
        };

        let passed = grade::Entity::find()
            .filter(grade::Column::StudentId.eq(student_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .filter(|grade| grade.average() >= self.passing_grade)
            .map(|grade| grade.course_id)
            .collect();

        Ok(StudentHistory {
            enrolled_current,
            passed,
        })
    }

    /// Courses the student may enroll in, ordered by code.
    pub async fn eligible_courses(
        &self,
        student_id: i32,
        department_id: Option<i32>,
    ) -> Result<Vec<course::Model>, RepositoryError> {
        find_required::<student::Entity, _>(self.db, student_id, "Student").await?;
        let current = current_semester(self.db).await?;
        let history = self.history(student_id, current.as_ref()).await?;

        let mut query = course::Entity::find();
        if let Some(department_id) = department_id {
            query = query.filter(course::Column::DepartmentId.eq(department_id));
        }
        let courses = query
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(history.eligible(courses))
    }

    /// Enrolls a student in a section for the current semester.
    pub async fn enroll(
        &self,
        student_id: i32,
        section_id: i32,
    ) -> Result<enrollment::Model, RepositoryError> {
        find_required::<student::Entity, _>(self.db, student_id, "Student").await?;
        let section = find_required::<section::Entity, _>(self.db, section_id, "Section").await?;
        let course = find_required::<course::Entity, _>(self.db, section.course_id, "Course").await?;

        let Some(current) = current_semester(self.db).await? else {
            counter!("enrollment_rejections_total", "reason" => "no_current_semester").increment(1);
            return Err(RepositoryError::rejected(
                "NO_CURRENT_SEMESTER",
                "No semester is marked current",
            ));
        };

        let history = self.history(student_id, Some(&current)).await?;
        if let Err(reason) = history.check(&course) {
            let label = match reason {
                Ineligible::AlreadyEnrolled => "already_enrolled",
                Ineligible::AlreadyPassed => "already_passed",
                Ineligible::PrerequisiteNotPassed { .. } => "prerequisite_not_passed",
            };
            counter!("enrollment_rejections_total", "reason" => label).increment(1);
            tracing::info!(student_id, course_id = course.id, reason = label, "Enrollment rejected");

            // Already enrolled this semester is a duplicate, not an eligibility failure.
            if reason == Ineligible::AlreadyEnrolled {
                return Err(RepositoryError::Conflict(reason.message()));
            }
            return Err(RepositoryError::Rejected {
                code: "COURSE_NOT_ELIGIBLE",
                message: reason.message(),
                details: Some(serde_json::json!({ "course_id": course.id, "reason": label })),
            });
        }

        let enrollment = enrollment::ActiveModel {
            student_id: Set(student_id),
            course_id: Set(course.id),
            section_id: Set(section.id),
            semester_id: Set(current.id),
            school_year: Set(current.school_year),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        tracing::info!(
            student_id,
            course_id = course.id,
            semester_id = current.id,
            "Student enrolled"
        );
        Ok(enrollment)
    }

    pub async fn delete(&self, student_id: i32, enrollment_id: i32) -> Result<(), RepositoryError> {
        let enrollment =
            find_required::<enrollment::Entity, _>(self.db, enrollment_id, "Enrollment").await?;
        if enrollment.student_id != student_id {
            return Err(RepositoryError::not_found(format!(
                "Enrollment {} not found",
                enrollment_id
            )));
        }
        delete_required::<enrollment::Entity, _>(self.db, enrollment_id, "Enrollment").await
    }
}

/// Attendance row as submitted for one student.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub student_id: i32,
    pub mark: String,
    pub comment: String,
}

pub struct AttendanceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AttendanceRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_section(
        &self,
        section_id: i32,
        page: PageRequest,
    ) -> Result<Page<attendance::Model>, RepositoryError> {
        find_required::<section::Entity, _>(self.db, section_id, "Section").await?;
        let query = attendance::Entity::find().filter(attendance::Column::SectionId.eq(section_id));
        fetch_page(self.db, query, attendance::Column::Id, page, |a| a.id).await
    }

    pub async fn list_for_student(
        &self,
        student_id: i32,
        page: PageRequest,
    ) -> Result<Page<attendance::Model>, RepositoryError> {
        find_required::<student::Entity, _>(self.db, student_id, "Student").await?;
        let query = attendance::Entity::find().filter(attendance::Column::StudentId.eq(student_id));
        fetch_page(self.db, query, attendance::Column::Id, page, |a| a.id).await
    }

    pub async fn get(&self, id: i32) -> Result<attendance::Model, RepositoryError> {
        find_required::<attendance::Entity, _>(self.db, id, "Attendance").await
    }

    /// Records attendance for a section in the current semester. Every
    /// student must be enrolled in the section this semester.
    pub async fn record(
        &self,
        section_id: i32,
        entries: Vec<NewAttendance>,
    ) -> Result<Vec<attendance::Model>, RepositoryError> {
        let section = find_required::<section::Entity, _>(self.db, section_id, "Section").await?;
        let current = current_semester(self.db).await?.ok_or_else(|| {
            RepositoryError::rejected("NO_CURRENT_SEMESTER", "No semester is marked current")
        })?;

        let roster = section_roster(self.db, section_id, current.id)
            .await
            .map_err(RepositoryError::database_error)?;
        let not_enrolled: Vec<i32> = entries
            .iter()
            .map(|entry| entry.student_id)
            .filter(|id| !roster.contains(id))
            .collect();
        if !not_enrolled.is_empty() {
            return Err(RepositoryError::Rejected {
                code: "STUDENT_NOT_ENROLLED",
                message: "Some students are not enrolled in this section".to_string(),
                details: Some(serde_json::json!({ "student_ids": not_enrolled })),
            });
        }

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = attendance::ActiveModel {
                mark: Set(entry.mark),
                comment: Set(entry.comment),
                student_id: Set(entry.student_id),
                course_id: Set(section.course_id),
                section_id: Set(section.id),
                semester_id: Set(current.id),
                school_year: Set(current.school_year),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
            created.push(row);
        }
        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        mark: Option<String>,
        comment: Option<String>,
    ) -> Result<attendance::Model, RepositoryError> {
        let mut row: attendance::ActiveModel = self.get(id).await?.into();
        if let Some(mark) = mark {
            row.mark = Set(mark);
        }
        if let Some(comment) = comment {
            row.comment = Set(comment);
        }
        row.update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<attendance::Entity, _>(self.db, id, "Attendance").await
    }
}

pub struct GradeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> GradeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_teach(&self, teach: &teach::Model) -> Result<Vec<grade::Model>, RepositoryError> {
        grade::Entity::find()
            .filter(grade::Column::SectionId.eq(teach.section_id))
            .filter(grade::Column::SemesterId.eq(teach.semester_id))
            .order_by_asc(grade::Column::StudentId)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_for_student(
        &self,
        student_id: i32,
        page: PageRequest,
    ) -> Result<Page<grade::Model>, RepositoryError> {
        find_required::<student::Entity, _>(self.db, student_id, "Student").await?;
        let query = grade::Entity::find().filter(grade::Column::StudentId.eq(student_id));
        fetch_page(self.db, query, grade::Column::Id, page, |g| g.id).await
    }

    /// Resolves the teacher, teach and section an upload targets.
    pub async fn upload_target(
        &self,
        teacher_id: i32,
        teach_id: i32,
    ) -> Result<(teach::Model, section::Model), GradeUploadError> {
        teacher::Entity::find_by_id(teacher_id)
            .one(self.db)
            .await?
            .ok_or(GradeUploadError::TeacherNotFound(teacher_id))?;

        let teach = teach::Entity::find_by_id(teach_id)
            .filter(teach::Column::TeacherId.eq(teacher_id))
            .one(self.db)
            .await?
            .ok_or(GradeUploadError::TeachNotFound(teach_id))?;

        let section = section::Entity::find_by_id(teach.section_id)
            .one(self.db)
            .await?
            .ok_or(GradeUploadError::SectionNotFound(teach.section_id))?;

        Ok((teach, section))
    }

    /// Checks the parsed rows against the students table and the section
    /// roster, then writes every grade in one transaction.
    pub async fn import(
        &self,
        teach: &teach::Model,
        rows: Vec<GradeRow>,
    ) -> Result<Vec<grade::Model>, GradeUploadError> {
        let sheet_ids: BTreeSet<i32> = rows.iter().map(|row| row.student_id).collect();

        let known: BTreeSet<i32> = student::Entity::find()
            .select_only()
            .column(student::Column::Id)
            .filter(student::Column::Id.is_in(sheet_ids.iter().copied()))
            .into_tuple::<i32>()
            .all(self.db)
            .await?
            .into_iter()
            .collect();
        let unknown: Vec<i32> = sheet_ids.difference(&known).copied().collect();
        if !unknown.is_empty() {
            return Err(GradeUploadError::StudentNotFound(unknown));
        }

        let roster = section_roster(self.db, teach.section_id, teach.semester_id).await?;
        crate::grading::compare_roster(&sheet_ids, &roster)?;

        let already_graded = grade::Entity::find()
            .filter(grade::Column::SectionId.eq(teach.section_id))
            .filter(grade::Column::SemesterId.eq(teach.semester_id))
            .filter(grade::Column::StudentId.is_in(sheet_ids.iter().copied()))
            .one(self.db)
            .await?;
        if already_graded.is_some() {
            return Err(GradeUploadError::AlreadyGraded);
        }

        // Bulk inserts skip the save hook, so the timestamp is set here.
        let now = chrono::Utc::now();
        let models: Vec<grade::ActiveModel> = rows
            .iter()
            .map(|row| {
                let [quiz, assignment, attendance, project, midterm_exam, final_exam] = row.scores;
                grade::ActiveModel {
                    student_id: Set(row.student_id),
                    course_id: Set(teach.course_id),
                    section_id: Set(teach.section_id),
                    semester_id: Set(teach.semester_id),
                    school_year: Set(teach.school_year),
                    teacher_id: Set(teach.teacher_id),
                    quiz: Set(quiz),
                    assignment: Set(assignment),
                    attendance: Set(attendance),
                    project: Set(project),
                    midterm_exam: Set(midterm_exam),
                    final_exam: Set(final_exam),
                    created_at: Set(now.into()),
                    ..Default::default()
                }
            })
            .collect();

        let txn = self.db.begin().await?;
        grade::Entity::insert_many(models).exec(&txn).await?;
        let created = grade::Entity::find()
            .filter(grade::Column::SectionId.eq(teach.section_id))
            .filter(grade::Column::SemesterId.eq(teach.semester_id))
            .order_by_asc(grade::Column::StudentId)
            .all(&txn)
            .await?;
        txn.commit().await?;

        counter!("grade_rows_imported_total").increment(created.len() as u64);
        tracing::info!(
            teach_id = teach.id,
            section_id = teach.section_id,
            rows = created.len(),
            "Imported grade sheet"
        );
        Ok(created)
    }
}
