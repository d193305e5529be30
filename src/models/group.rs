//! Group entity model
//!
//! Named roles. The seeded `Admin`, `Registrar`, `Teacher` and `Student`
//! groups drive permission checks.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_group::Entity")]
    UserGroup,
    #[sea_orm(has_many = "super::group_permission::Entity")]
    GroupPermission,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_group::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_group::Relation::Group.def().rev())
    }
}

impl Related<super::permission::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_permission::Relation::Permission.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_permission::Relation::Group.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
