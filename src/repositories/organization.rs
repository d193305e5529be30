//! Departments, majors, buildings, offices, classrooms and the addresses
//! attached to them.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait, TryIntoModel,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{delete_required, find_required};
use crate::error::RepositoryError;
use crate::models::{address, building, classroom, department, major, office};

/// Postal address fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AddressInput {
    #[schema(example = "12 Rizal Ave")]
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

/// Writes `input` over the address `existing`, or inserts a new row.
pub(crate) async fn upsert_address<C: ConnectionTrait>(
    db: &C,
    existing: Option<i32>,
    input: AddressInput,
) -> Result<address::Model, RepositoryError> {
    let mut model = match existing {
        Some(id) => find_required::<address::Entity, _>(db, id, "Address")
            .await?
            .into_active_model(),
        None => <address::ActiveModel as sea_orm::ActiveModelTrait>::default(),
    };

    model.street = Set(input.street);
    model.city = Set(input.city);
    model.province = Set(input.province);
    model.postal_code = Set(input.postal_code);
    model.country = Set(input.country);

    model
        .save(db)
        .await
        .map_err(RepositoryError::database_error)?
        .try_into_model()
        .map_err(RepositoryError::database_error)
}

pub(crate) async fn find_address<C: ConnectionTrait>(
    db: &C,
    id: Option<i32>,
) -> Result<Option<address::Model>, RepositoryError> {
    match id {
        Some(id) => address::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(RepositoryError::database_error),
        None => Ok(None),
    }
}

pub struct DepartmentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DepartmentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<department::Model>, RepositoryError> {
        department::Entity::find()
            .order_by_asc(department::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<department::Model, RepositoryError> {
        find_required::<department::Entity, _>(self.db, id, "Department").await
    }

    pub async fn save(
        &self,
        model: department::ActiveModel,
    ) -> Result<department::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    /// Deletes the department together with its address.
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let department = self.get(id).await?;
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        delete_required::<department::Entity, _>(&txn, id, "Department").await?;
        if let Some(address_id) = department.address_id {
            delete_required::<address::Entity, _>(&txn, address_id, "Address").await?;
        }
        txn.commit().await.map_err(RepositoryError::database_error)
    }

    pub async fn address(&self, id: i32) -> Result<Option<address::Model>, RepositoryError> {
        let department = self.get(id).await?;
        find_address(self.db, department.address_id).await
    }

    pub async fn put_address(
        &self,
        id: i32,
        input: AddressInput,
    ) -> Result<address::Model, RepositoryError> {
        let department = self.get(id).await?;
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let address = upsert_address(&txn, department.address_id, input).await?;
        if department.address_id != Some(address.id) {
            let mut department = department.into_active_model();
            department.address_id = Set(Some(address.id));
            department
                .update(&txn)
                .await
                .map_err(RepositoryError::database_error)?;
        }

        txn.commit().await.map_err(RepositoryError::database_error)?;
        Ok(address)
    }

    pub async fn delete_address(&self, id: i32) -> Result<(), RepositoryError> {
        let department = self.get(id).await?;
        let Some(address_id) = department.address_id else {
            return Err(RepositoryError::not_found(format!(
                "Department {} has no address",
                id
            )));
        };

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        let mut department = department.into_active_model();
        department.address_id = Set(None);
        department
            .update(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        delete_required::<address::Entity, _>(&txn, address_id, "Address").await?;
        txn.commit().await.map_err(RepositoryError::database_error)
    }
}

pub struct MajorRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> MajorRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_department(
        &self,
        department_id: i32,
    ) -> Result<Vec<major::Model>, RepositoryError> {
        find_required::<department::Entity, _>(self.db, department_id, "Department").await?;
        major::Entity::find()
            .filter(major::Column::DepartmentId.eq(department_id))
            .order_by_asc(major::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<major::Model, RepositoryError> {
        find_required::<major::Entity, _>(self.db, id, "Major").await
    }

    /// Loads a major only if it belongs to the department.
    pub async fn get_in_department(
        &self,
        department_id: i32,
        id: i32,
    ) -> Result<major::Model, RepositoryError> {
        let major = self.get(id).await?;
        if major.department_id != department_id {
            return Err(RepositoryError::not_found(format!(
                "Major {} not found in department {}",
                id, department_id
            )));
        }
        Ok(major)
    }

    pub async fn save(&self, model: major::ActiveModel) -> Result<major::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<major::Entity, _>(self.db, id, "Major").await
    }
}

pub struct BuildingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BuildingRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<building::Model>, RepositoryError> {
        building::Entity::find()
            .order_by_asc(building::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<building::Model, RepositoryError> {
        find_required::<building::Entity, _>(self.db, id, "Building").await
    }

    pub async fn save(
        &self,
        model: building::ActiveModel,
    ) -> Result<building::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    /// Deletes the building and its address; offices go with it, classrooms
    /// block the delete.
    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let building = self.get(id).await?;
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        delete_required::<building::Entity, _>(&txn, id, "Building").await?;
        if let Some(address_id) = building.address_id {
            delete_required::<address::Entity, _>(&txn, address_id, "Address").await?;
        }
        txn.commit().await.map_err(RepositoryError::database_error)
    }

    pub async fn address(&self, id: i32) -> Result<Option<address::Model>, RepositoryError> {
        let building = self.get(id).await?;
        find_address(self.db, building.address_id).await
    }

    pub async fn put_address(
        &self,
        id: i32,
        input: AddressInput,
    ) -> Result<address::Model, RepositoryError> {
        let building = self.get(id).await?;
        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let address = upsert_address(&txn, building.address_id, input).await?;
        if building.address_id != Some(address.id) {
            let mut building = building.into_active_model();
            building.address_id = Set(Some(address.id));
            building
                .update(&txn)
                .await
                .map_err(RepositoryError::database_error)?;
        }

        txn.commit().await.map_err(RepositoryError::database_error)?;
        Ok(address)
    }

    pub async fn delete_address(&self, id: i32) -> Result<(), RepositoryError> {
        let building = self.get(id).await?;
        let Some(address_id) = building.address_id else {
            return Err(RepositoryError::not_found(format!(
                "Building {} has no address",
                id
            )));
        };

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        let mut building = building.into_active_model();
        building.address_id = Set(None);
        building
            .update(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        delete_required::<address::Entity, _>(&txn, address_id, "Address").await?;
        txn.commit().await.map_err(RepositoryError::database_error)
    }
}

pub struct OfficeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OfficeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_building(
        &self,
        building_id: i32,
    ) -> Result<Vec<office::Model>, RepositoryError> {
        find_required::<building::Entity, _>(self.db, building_id, "Building").await?;
        office::Entity::find()
            .filter(office::Column::BuildingId.eq(building_id))
            .order_by_asc(office::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get_in_building(
        &self,
        building_id: i32,
        id: i32,
    ) -> Result<office::Model, RepositoryError> {
        let office = find_required::<office::Entity, _>(self.db, id, "Office").await?;
        if office.building_id != building_id {
            return Err(RepositoryError::not_found(format!(
                "Office {} not found in building {}",
                id, building_id
            )));
        }
        Ok(office)
    }

    pub async fn save(&self, model: office::ActiveModel) -> Result<office::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<office::Entity, _>(self.db, id, "Office").await
    }
}

pub struct ClassroomRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClassroomRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, building_id: Option<i32>) -> Result<Vec<classroom::Model>, RepositoryError> {
        let mut query = classroom::Entity::find();
        if let Some(building_id) = building_id {
            query = query.filter(classroom::Column::BuildingId.eq(building_id));
        }
        query
            .order_by_asc(classroom::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<classroom::Model, RepositoryError> {
        find_required::<classroom::Entity, _>(self.db, id, "Classroom").await
    }

    pub async fn save(
        &self,
        model: classroom::ActiveModel,
    ) -> Result<classroom::Model, RepositoryError> {
        model
            .save(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .try_into_model()
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<classroom::Entity, _>(self.db, id, "Classroom").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{init_pool, run_migrations};

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

    fn address(city: &str) -> AddressInput {
        AddressInput {
            street: "1 Main St".to_string(),
            city: city.to_string(),
            province: "Metro".to_string(),
            postal_code: "1000".to_string(),
            country: "PH".to_string(),
        }
    }

    #[tokio::test]
    async fn put_address_creates_then_replaces_in_place() {
        let db = setup_test_db().await;
        let repo = DepartmentRepository::new(&db);
        let department = repo
            .save(department::ActiveModel {
                name: Set("Mathematics".to_string()),
                budget: Set(1000.0),
                duty: Set(String::new()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(repo.address(department.id).await.unwrap().is_none());

        let first = repo.put_address(department.id, address("Manila")).await.unwrap();
        let second = repo.put_address(department.id, address("Cebu")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.address(department.id).await.unwrap().unwrap().city, "Cebu");

        repo.delete_address(department.id).await.unwrap();
        assert!(repo.address(department.id).await.unwrap().is_none());
        assert!(address::Entity::find_by_id(first.id).one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn classroom_protects_its_building() {
        let db = setup_test_db().await;
        let buildings = BuildingRepository::new(&db);
        let building = buildings
            .save(building::ActiveModel {
                name: Set("Main".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        ClassroomRepository::new(&db)
            .save(classroom::ActiveModel {
                name: Set("M101".to_string()),
                dimension: Set("10x12".to_string()),
                building_id: Set(building.id),
                ..Default::default()
            })
            .await
            .unwrap();

        match buildings.delete(building.id).await {
            Err(RepositoryError::Database(err)) => {
                assert!(crate::error::is_foreign_key_violation(&err))
            }
            other => panic!("expected foreign key violation, got {other:?}"),
        }
        assert!(buildings.get(building.id).await.is_ok());
    }
}
