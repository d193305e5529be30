//! Section entity model

use sea_orm::entity::prelude::*;

/// A scheduled offering of a course in a room and time slot
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Short label (at most two characters), unique per course
    pub name: String,

    pub course_id: i32,

    pub classroom_id: i32,

    pub classtime_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Restrict"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id",
        on_delete = "Restrict"
    )]
    Classroom,
    #[sea_orm(
        belongs_to = "super::classtime::Entity",
        from = "Column::ClasstimeId",
        to = "super::classtime::Column::Id",
        on_delete = "Restrict"
    )]
    Classtime,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::classtime::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classtime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
