//! Groups (roles) and their permissions.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{delete_required, find_required};
use crate::error::RepositoryError;
use crate::models::{group, group_permission, permission, user, user_group};

pub struct GroupRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> GroupRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<group::Model>, RepositoryError> {
        group::Entity::find()
            .order_by_asc(group::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<group::Model, RepositoryError> {
        find_required::<group::Entity, _>(self.db, id, "Group").await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<group::Model>, RepositoryError> {
        group::Entity::find()
            .filter(group::Column::Name.eq(name))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, name: String) -> Result<group::Model, RepositoryError> {
        group::ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn rename(&self, id: i32, name: String) -> Result<group::Model, RepositoryError> {
        let mut group = self.get(id).await?.into_active_model();
        group.name = Set(name);
        group
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        delete_required::<group::Entity, _>(self.db, id, "Group").await
    }

    pub async fn permissions(
        &self,
        group: &group::Model,
    ) -> Result<Vec<permission::Model>, RepositoryError> {
        group
            .find_related(permission::Entity)
            .order_by_asc(permission::Column::Codename)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn members(&self, group: &group::Model) -> Result<Vec<user::Model>, RepositoryError> {
        group
            .find_related(user::Entity)
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Adds users to the group; users already in it are left alone.
    pub async fn add_users(&self, group_id: i32, user_ids: &[i32]) -> Result<(), RepositoryError> {
        self.get(group_id).await?;

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        for &user_id in user_ids {
            find_required::<user::Entity, _>(&txn, user_id, "User").await?;
            user_group::Entity::insert(user_group::ActiveModel {
                user_id: Set(user_id),
                group_id: Set(group_id),
            })
            .on_conflict(
                OnConflict::columns([user_group::Column::UserId, user_group::Column::GroupId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        }
        txn.commit().await.map_err(RepositoryError::database_error)?;

        tracing::info!(group_id, count = user_ids.len(), "Added users to group");
        Ok(())
    }

    pub async fn remove_users(&self, group_id: i32, user_ids: &[i32]) -> Result<u64, RepositoryError> {
        self.get(group_id).await?;

        let result = user_group::Entity::delete_many()
            .filter(user_group::Column::GroupId.eq(group_id))
            .filter(user_group::Column::UserId.is_in(user_ids.iter().copied()))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(group_id, removed = result.rows_affected, "Removed users from group");
        Ok(result.rows_affected)
    }

    /// Replaces the group's permission set.
    pub async fn set_permissions(
        &self,
        group_id: i32,
        permission_ids: &[i32],
    ) -> Result<Vec<permission::Model>, RepositoryError> {
        let group = self.get(group_id).await?;

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        group_permission::Entity::delete_many()
            .filter(group_permission::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        let mut unique_ids = permission_ids.to_vec();
        unique_ids.sort_unstable();
        unique_ids.dedup();
        for permission_id in unique_ids {
            find_required::<permission::Entity, _>(&txn, permission_id, "Permission").await?;
            group_permission::ActiveModel {
                group_id: Set(group_id),
                permission_id: Set(permission_id),
            }
            .insert(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        }
        txn.commit().await.map_err(RepositoryError::database_error)?;

        self.permissions(&group).await
    }
}

pub struct PermissionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PermissionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<permission::Model>, RepositoryError> {
        permission::Entity::find()
            .order_by_asc(permission::Column::Codename)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<permission::Model, RepositoryError> {
        find_required::<permission::Entity, _>(self.db, id, "Permission").await
    }

    pub async fn find_by_codename(
        &self,
        codename: &str,
    ) -> Result<Option<permission::Model>, RepositoryError> {
        permission::Entity::find()
            .filter(permission::Column::Codename.eq(codename))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, name: &str, codename: &str) -> Result<permission::Model, RepositoryError> {
        permission::ActiveModel {
            name: Set(name.to_string()),
            codename: Set(codename.to_string()),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }
}
