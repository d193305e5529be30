//! ClassTime entity model

use sea_orm::entity::prelude::*;

/// Weekly meeting slot, e.g. `08:00AM`-`09:30AM` on `MWF`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "classtimes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `HH:MMAM` or `HH:MMPM`
    pub start_time: String,

    pub end_time: String,

    /// Day letters from `MTWHFS`
    pub week_days: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
