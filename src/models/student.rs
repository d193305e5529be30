//! Student entity model

use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};
use sea_orm::{ActiveValue::Set, ConnectionTrait};

/// Student profile extending exactly one user account
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,

    /// Registrar-issued identifier printed on documents
    #[sea_orm(unique)]
    pub student_number: String,

    pub major_id: i32,

    /// 1..=6
    pub year_level: i32,

    pub is_transfer_student: bool,

    pub admission_year: i32,

    pub phone: String,

    pub birth_date: Date,

    pub gender: String,

    pub image: Option<String>,

    /// Media-relative path of the transcript of records
    pub tor: Option<String>,

    #[sea_orm(unique)]
    pub address_id: Option<i32>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::major::Entity",
        from = "Column::MajorId",
        to = "super::major::Column::Id",
        on_delete = "Restrict"
    )]
    Major,
    #[sea_orm(
        belongs_to = "super::school_year::Entity",
        from = "Column::AdmissionYear",
        to = "super::school_year::Column::Year",
        on_delete = "Restrict"
    )]
    AdmissionYear,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::Id",
        on_delete = "SetNull"
    )]
    Address,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
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
