//! Permission entity model

use sea_orm::entity::prelude::*;

/// A named capability that can be granted to groups
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Human readable description, e.g. "Can add grade"
    pub name: String,

    /// Machine identifier, e.g. `add_grade`
    #[sea_orm(unique)]
    pub codename: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_permission::Entity")]
    GroupPermission,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_permission::Relation::Group.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_permission::Relation::Permission.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
