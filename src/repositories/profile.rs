//! Employee, teacher and student profiles.
//!
//! A profile and its embedded address are written in one transaction, so a
//! failed profile insert never leaves an orphaned address behind.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, TryIntoModel, Value,
};

use super::organization::{AddressInput, find_address, upsert_address};
use super::{Page, PageRequest, delete_required, fetch_page, find_required};
use crate::error::RepositoryError;
use crate::models::{address, employee, student, teacher};

type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

/// Saves `model`, first writing `address` (if given) and linking it through
/// `address_column`.
async fn save_with_address<A>(
    db: &DatabaseConnection,
    mut model: A,
    existing_address: Option<i32>,
    address: Option<AddressInput>,
    address_column: <A::Entity as EntityTrait>::Column,
) -> Result<ModelOf<A>, RepositoryError>
where
    A: ActiveModelTrait + ActiveModelBehavior + TryIntoModel<ModelOf<A>> + Send,
    ModelOf<A>: IntoActiveModel<A>,
{
    let txn = db.begin().await.map_err(RepositoryError::database_error)?;

    if let Some(address) = address {
        let saved = upsert_address(&txn, existing_address, address).await?;
        model.set(address_column, Value::Int(Some(saved.id)));
    }

    let saved = model
        .save(&txn)
        .await
        .map_err(RepositoryError::database_error)?
        .try_into_model()
        .map_err(RepositoryError::database_error)?;

    txn.commit().await.map_err(RepositoryError::database_error)?;
    Ok(saved)
}

/// Deletes a profile row and the address it owned.
async fn delete_with_address<E>(
    db: &DatabaseConnection,
    id: i32,
    address_id: Option<i32>,
    label: &str,
) -> Result<(), RepositoryError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
{
    let txn = db.begin().await.map_err(RepositoryError::database_error)?;
    delete_required::<E, _>(&txn, id, label).await?;
    if let Some(address_id) = address_id {
        delete_required::<address::Entity, _>(&txn, address_id, "Address").await?;
    }
    txn.commit().await.map_err(RepositoryError::database_error)
}

pub struct EmployeeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EmployeeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<employee::Model>, RepositoryError> {
        employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<employee::Model, RepositoryError> {
        find_required::<employee::Entity, _>(self.db, id, "Employee").await
    }

    pub async fn save(
        &self,
        model: employee::ActiveModel,
        existing_address: Option<i32>,
        address: Option<AddressInput>,
    ) -> Result<employee::Model, RepositoryError> {
        save_with_address(self.db, model, existing_address, address, employee::Column::AddressId).await
    }

    pub async fn address(
        &self,
        employee: &employee::Model,
    ) -> Result<Option<address::Model>, RepositoryError> {
        find_address(self.db, employee.address_id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let employee = self.get(id).await?;
        delete_with_address::<employee::Entity>(self.db, id, employee.address_id, "Employee").await
    }
}

pub struct TeacherRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TeacherRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<teacher::Model>, RepositoryError> {
        teacher::Entity::find()
            .order_by_asc(teacher::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<teacher::Model, RepositoryError> {
        find_required::<teacher::Entity, _>(self.db, id, "Teacher").await
    }

    pub async fn find_by_user(&self, user_id: i32) -> Result<Option<teacher::Model>, RepositoryError> {
        teacher::Entity::find()
            .filter(teacher::Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn save(
        &self,
        model: teacher::ActiveModel,
        existing_address: Option<i32>,
        address: Option<AddressInput>,
    ) -> Result<teacher::Model, RepositoryError> {
        save_with_address(self.db, model, existing_address, address, teacher::Column::AddressId).await
    }

    pub async fn address(
        &self,
        teacher: &teacher::Model,
    ) -> Result<Option<address::Model>, RepositoryError> {
        find_address(self.db, teacher.address_id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let teacher = self.get(id).await?;
        delete_with_address::<teacher::Entity>(self.db, id, teacher.address_id, "Teacher").await
    }
}

pub struct StudentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StudentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        major_id: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<student::Model>, RepositoryError> {
        let mut query = student::Entity::find();
        if let Some(major_id) = major_id {
            query = query.filter(student::Column::MajorId.eq(major_id));
        }
        fetch_page(self.db, query, student::Column::Id, page, |s| s.id).await
    }

    pub async fn get(&self, id: i32) -> Result<student::Model, RepositoryError> {
        find_required::<student::Entity, _>(self.db, id, "Student").await
    }

    pub async fn find_by_user(&self, user_id: i32) -> Result<Option<student::Model>, RepositoryError> {
        student::Entity::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn save(
        &self,
        model: student::ActiveModel,
        existing_address: Option<i32>,
        address: Option<AddressInput>,
    ) -> Result<student::Model, RepositoryError> {
        save_with_address(self.db, model, existing_address, address, student::Column::AddressId).await
    }

    pub async fn address(
        &self,
        student: &student::Model,
    ) -> Result<Option<address::Model>, RepositoryError> {
        find_address(self.db, student.address_id).await
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let student = self.get(id).await?;
        delete_with_address::<student::Entity>(self.db, id, student.address_id, "Student").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{init_pool, run_migrations};
    use crate::models::{department, major, school_year, user};
    use chrono::NaiveDate;
    use sea_orm::Set;

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

    async fn fixtures(db: &DatabaseConnection) -> (user::Model, major::Model) {
        let user = user::ActiveModel {
            username: Set("student1".to_string()),
            email: Set("student1@school.test".to_string()),
            first_name: Set("Stu".to_string()),
            last_name: Set("Dent".to_string()),
            password_hash: Set("pbkdf2_sha256$1$salt$x".to_string()),
            is_staff: Set(false),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let department = department::ActiveModel {
            name: Set("Science".to_string()),
            budget: Set(0.0),
            duty: Set(String::new()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        let major = major::ActiveModel {
            name: Set("Biology".to_string()),
            department_id: Set(department.id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        school_year::ActiveModel { year: Set(2024) }
            .insert(db)
            .await
            .unwrap();
        (user, major)
    }

    fn student(user_id: i32, major_id: i32, number: &str) -> student::ActiveModel {
        student::ActiveModel {
            user_id: Set(user_id),
            student_number: Set(number.to_string()),
            major_id: Set(major_id),
            year_level: Set(1),
            is_transfer_student: Set(false),
            admission_year: Set(2024),
            phone: Set("+63 912 345 6789".to_string()),
            birth_date: Set(NaiveDate::from_ymd_opt(2005, 1, 2).unwrap()),
            gender: Set("F".to_string()),
            ..Default::default()
        }
    }

    fn address() -> AddressInput {
        AddressInput {
            street: "1 Main St".to_string(),
            city: "Manila".to_string(),
            province: "Metro".to_string(),
            postal_code: "1000".to_string(),
            country: "PH".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_student_with_address() {
        let db = setup_test_db().await;
        let (user, major) = fixtures(&db).await;
        let repo = StudentRepository::new(&db);

        let created = repo
            .save(student(user.id, major.id, "2024-0001"), None, Some(address()))
            .await
            .unwrap();
        let stored = repo.address(&created).await.unwrap().unwrap();
        assert_eq!(stored.city, "Manila");

        repo.delete(created.id).await.unwrap();
        assert!(address::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_profile_insert_rolls_back_address() {
        let db = setup_test_db().await;
        let (user, major) = fixtures(&db).await;
        let repo = StudentRepository::new(&db);
        repo.save(student(user.id, major.id, "2024-0001"), None, None)
            .await
            .unwrap();

        // Same user twice violates the one-profile-per-user constraint.
        let result = repo
            .save(student(user.id, major.id, "2024-0002"), None, Some(address()))
            .await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert!(address::Entity::find().all(&db).await.unwrap().is_empty());
    }
}
