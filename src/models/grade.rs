//! Grade entity model
//!
//! Six component scores per student, section and semester. Rows are only
//! created through the spreadsheet upload.

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue::Set, ConnectionTrait};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: i32,

    pub course_id: i32,

    pub section_id: i32,

    pub semester_id: i32,

    pub school_year: i32,

    /// Teacher who uploaded the sheet
    pub teacher_id: i32,

    pub quiz: f64,

    pub assignment: f64,

    pub attendance: f64,

    pub project: f64,

    pub midterm_exam: f64,

    pub final_exam: f64,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Component scores in sheet column order
    pub fn scores(&self) -> [f64; 6] {
        [
            self.quiz,
            self.assignment,
            self.attendance,
            self.project,
            self.midterm_exam,
            self.final_exam,
        ]
    }

    /// Unweighted mean of the six components
    pub fn average(&self) -> f64 {
        self.scores().iter().sum::<f64>() / 6.0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Restrict"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Restrict"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_delete = "Restrict"
    )]
    Teacher,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            self.created_at = Set(chrono::Utc::now().into());
        }
        Ok(self)
    }
}
