//! Course entity model

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveValue::Set, ConnectionTrait};

/// Course catalogue entry
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Unique catalogue code, e.g. `CS101`
    #[sea_orm(unique)]
    pub code: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Credit units (1..=6)
    pub units: i32,

    pub department_id: i32,

    /// Course that must be passed before enrolling in this one
    pub prerequisite_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "Restrict"
    )]
    Department,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::PrerequisiteId",
        to = "Column::Id",
        on_delete = "Restrict"
    )]
    Prerequisite,
    #[sea_orm(has_many = "super::section::Entity")]
    Section,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            self.created_at = Set(now.into());
        }
        self.updated_at = Set(now.into());
        Ok(self)
    }
}
