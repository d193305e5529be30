//! School years, semesters, class times, courses and sections.

use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait, TryIntoModel,
};

use super::{Page, PageRequest, delete_required, fetch_page, find_required};
use crate::error::RepositoryError;
use crate::models::{classtime, course, school_year, section, semester};

pub struct SchoolYearRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SchoolYearRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<school_year::Model>, RepositoryError> {
        school_year::Entity::find()
            .order_by_desc(school_year::Column::Year)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, year: i32) -> Result<school_year::Model, RepositoryError> {
        find_required::<school_year::Entity, _>(self.db, year, "School year").await
    }

    pub async fn create(&self, year: i32) -> Result<school_year::Model, RepositoryError> {
        school_year::ActiveModel {
            year: ActiveValue::Set(year),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, year: i32) -> Result<(), RepositoryError> {
        delete_required::<school_year::Entity, _>(self.db, year, "School year").await
    }
}

pub struct SemesterRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SemesterRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<semester::Model>, RepositoryError> {
        semester::Entity::find()
            .order_by_desc(semester::Column::SchoolYear)
            .order_by_asc(semester::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<semester::Model, RepositoryError> {
        find_required::<semester::Entity, _>(self.db, id, "Semester").await
    }

    pub async fn current(&self) -> Result<Option<semester::Model>, RepositoryError> {
        semester::Entity::find()
            .filter(semester::Column::IsCurrent.eq(true))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Inserts or updates a semester. Marking it current clears the flag on
    /// every other semester in the same transaction.
    pub async fn save(
        &self,
        model: semester::ActiveModel,
    ) -> Result<semester::Model, RepositoryError> {
        let becomes_current = matches!(model.is_current, ActiveValue::Set(true));

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        let saved = model
            .save(&txn)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)?;
        txn.commit().await.map_err(RepositoryError::database_error)?;

        if becomes_current {
            tracing::info!(
                semester_id = saved.id,
                term = %saved.term,
                school_year = saved.school_year,
                "Current semester changed"
            );
        }
        Ok(saved)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<semester::Entity, _>(self.db, id, "Semester").await
    }
}

pub struct ClasstimeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClasstimeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<classtime::Model>, RepositoryError> {
        classtime::Entity::find()
            .order_by_asc(classtime::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<classtime::Model, RepositoryError> {
        find_required::<classtime::Entity, _>(self.db, id, "Class time").await
    }

    pub async fn save(
        &self,
        model: classtime::ActiveModel,
    ) -> Result<classtime::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<classtime::Entity, _>(self.db, id, "Class time").await
    }
}

/// Course list filters; both match exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseFilter {
    pub department_id: Option<i32>,
    pub prerequisite_id: Option<i32>,
}

pub struct CourseRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CourseRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Page<course::Model>, RepositoryError> {
        let mut query = course::Entity::find();
        if let Some(department_id) = filter.department_id {
            query = query.filter(course::Column::DepartmentId.eq(department_id));
        }
        if let Some(prerequisite_id) = filter.prerequisite_id {
            query = query.filter(course::Column::PrerequisiteId.eq(prerequisite_id));
        }
        fetch_page(self.db, query, course::Column::Id, page, |c| c.id).await
    }

    /// Every course, optionally limited to one department.
    pub async fn all(&self, department_id: Option<i32>) -> Result<Vec<course::Model>, RepositoryError> {
        let mut query = course::Entity::find();
        if let Some(department_id) = department_id {
            query = query.filter(course::Column::DepartmentId.eq(department_id));
        }
        query
            .order_by_asc(course::Column::Code)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<course::Model, RepositoryError> {
        find_required::<course::Entity, _>(self.db, id, "Course").await
    }

    /// Saves a course after checking its prerequisite exists and is not the
    /// course itself.
    pub async fn save(&self, model: course::ActiveModel) -> Result<course::Model, RepositoryError> {
        if let ActiveValue::Set(Some(prerequisite_id)) = model.prerequisite_id {
            if let ActiveValue::Set(id) | ActiveValue::Unchanged(id) = model.id
                && id == prerequisite_id
            {
                return Err(RepositoryError::Validation(
                    "A course cannot be its own prerequisite".to_string(),
                ));
            }
            if course::Entity::find_by_id(prerequisite_id)
                .one(self.db)
                .await
                .map_err(RepositoryError::database_error)?
                .is_none()
            {
                return Err(RepositoryError::Validation(format!(
                    "Prerequisite course {} does not exist",
                    prerequisite_id
                )));
            }
        }

        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<course::Entity, _>(self.db, id, "Course").await
    }
}

pub struct SectionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SectionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_course(&self, course_id: i32) -> Result<Vec<section::Model>, RepositoryError> {
        find_required::<course::Entity, _>(self.db, course_id, "Course").await?;
        section::Entity::find()
            .filter(section::Column::CourseId.eq(course_id))
            .order_by_asc(section::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<section::Model, RepositoryError> {
        find_required::<section::Entity, _>(self.db, id, "Section").await
    }

    pub async fn get_in_course(
        &self,
        course_id: i32,
        id: i32,
    ) -> Result<section::Model, RepositoryError> {
        let section = self.get(id).await?;
        if section.course_id != course_id {
            return Err(RepositoryError::not_found(format!(
                "Section {} not found in course {}",
                id, course_id
            )));
        }
        Ok(section)
    }

    pub async fn save(&self, model: section::ActiveModel) -> Result<section::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<section::Entity, _>(self.db, id, "Section").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{init_pool, run_migrations};
    use sea_orm::{IntoActiveModel, Set};

    async fn setup_test_db() -> DatabaseConnection {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            ..Default::default()
        };
        let db = init_pool(&config).await.expect("Failed to init test DB");
        run_migrations(&db).await.expect("Failed to migrate test DB");
        db
    }

    fn semester(term: &str, year: i32, is_current: bool) -> semester::ActiveModel {
        semester::ActiveModel {
            term: Set(term.to_string()),
            school_year: Set(year),
            is_current: Set(is_current),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn only_one_semester_is_current() {
        let db = setup_test_db().await;
        SchoolYearRepository::new(&db).create(2024).await.unwrap();
        let repo = SemesterRepository::new(&db);

        let first = repo.save(semester("first", 2024, true)).await.unwrap();
        let second = repo.save(semester("second", 2024, true)).await.unwrap();

        let current = repo.current().await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
        assert!(!repo.get(first.id).await.unwrap().is_current);

        let mut again = repo.get(first.id).await.unwrap().into_active_model();
        again.is_current = Set(true);
        repo.save(again).await.unwrap();

        let current: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_current)
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, first.id);
    }

    #[tokio::test]
    async fn school_years_list_newest_first() {
        let db = setup_test_db().await;
        let repo = SchoolYearRepository::new(&db);
        for year in [2023, 2025, 2024] {
            repo.create(year).await.unwrap();
        }
        let years: Vec<_> = repo.list().await.unwrap().into_iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2025, 2024, 2023]);
    }

    #[tokio::test]
    async fn year_with_semesters_is_protected() {
        let db = setup_test_db().await;
        let years = SchoolYearRepository::new(&db);
        years.create(2024).await.unwrap();
        SemesterRepository::new(&db)
            .save(semester("first", 2024, false))
            .await
            .unwrap();

        assert!(matches!(
            years.delete(2024).await,
            Err(RepositoryError::Database(_))
        ));
    }
}
