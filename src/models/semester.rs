//! Semester entity model
//!
//! At most one semester is current at any time. Saving a semester with
//! `is_current = true` clears the flag on every other semester first, so
//! callers must save through a transaction to keep the swap atomic.

use sea_orm::ConnectionTrait;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue;

pub const TERMS: [&str; 3] = ["first", "second", "summer"];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "semesters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// One of `first`, `second`, `summer`
    pub term: String,

    /// Owning school year (unique together with `term`)
    pub school_year: i32,

    pub is_current: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_year::Entity",
        from = "Column::SchoolYear",
        to = "super::school_year::Column::Year",
        on_delete = "Restrict"
    )]
    SchoolYear,
}

impl Related<super::school_year::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolYear.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !matches!(self.is_current, ActiveValue::Set(true)) {
            return Ok(self);
        }

        let mut clear = Entity::update_many()
            .col_expr(Column::IsCurrent, Expr::value(false))
            .filter(Column::IsCurrent.eq(true));

        if let ActiveValue::Set(id) | ActiveValue::Unchanged(id) = &self.id {
            clear = clear.filter(Column::Id.ne(*id));
        }

        let cleared = clear.exec(db).await?;
        if cleared.rows_affected > 0 {
            tracing::info!(
                cleared = cleared.rows_affected,
                "Cleared previous current semester"
            );
        }

        Ok(self)
    }
}
