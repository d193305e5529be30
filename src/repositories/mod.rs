//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! school schema. Multi-row writes (profile plus address, semester toggles,
//! grade uploads) run inside a single transaction.

pub mod curriculum;
pub mod group;
pub mod organization;
pub mod profile;
pub mod records;
pub mod user;

pub use curriculum::{
    ClasstimeRepository, CourseFilter, CourseRepository, SchoolYearRepository, SectionRepository,
    SemesterRepository,
};
pub use group::{GroupRepository, PermissionRepository};
pub use organization::{
    AddressInput, BuildingRepository, ClassroomRepository, DepartmentRepository, MajorRepository,
    OfficeRepository,
};
pub use profile::{EmployeeRepository, StudentRepository, TeacherRepository};
pub use records::{
    AttendanceRepository, EnrollmentRepository, GradeRepository, NewAttendance, TeachRepository,
};
pub use user::{NewUser, UserRepository};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};

use crate::error::RepositoryError;

/// Keyset page request: rows with an id greater than `after_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub after_id: Option<i32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: crate::handlers::types::DEFAULT_PAGE_LIMIT,
            after_id: None,
        }
    }
}

/// One page of rows plus the id to continue after, if more exist.
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub next_after: Option<i32>,
}

/// Runs `select` as a keyset page ordered by `id_column`.
pub(crate) async fn fetch_page<E, C>(
    db: &C,
    select: Select<E>,
    id_column: E::Column,
    page: PageRequest,
    id_of: impl Fn(&E::Model) -> i32,
) -> Result<Page<E::Model>, RepositoryError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query = select;
    if let Some(after_id) = page.after_id {
        query = query.filter(id_column.gt(after_id));
    }

    let mut items = query
        .order_by_asc(id_column)
        .limit(page.limit + 1)
        .all(db)
        .await
        .map_err(RepositoryError::database_error)?;

    let next_after = if items.len() as u64 > page.limit {
        items.truncate(page.limit as usize);
        items.last().map(&id_of)
    } else {
        None
    };

    Ok(Page { items, next_after })
}

/// Loads a row by primary key or fails with a not-found error.
pub(crate) async fn find_required<E, C>(
    db: &C,
    id: i32,
    label: &str,
) -> Result<E::Model, RepositoryError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(db)
        .await
        .map_err(RepositoryError::database_error)?
        .ok_or_else(|| RepositoryError::not_found(format!("{} {} not found", label, id)))
}

/// Deletes a row by primary key; a missing row is a not-found error.
pub(crate) async fn delete_required<E, C>(db: &C, id: i32, label: &str) -> Result<(), RepositoryError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    let result = E::delete_by_id(id)
        .exec(db)
        .await
        .map_err(RepositoryError::database_error)?;

    if result.rows_affected == 0 {
        return Err(RepositoryError::not_found(format!("{} {} not found", label, id)));
    }
    Ok(())
}

/// True when a row with the primary key exists.
pub async fn exists<E, C>(db: &C, id: i32) -> Result<bool, RepositoryError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(db)
        .await
        .map(|row| row.is_some())
        .map_err(RepositoryError::database_error)
}
