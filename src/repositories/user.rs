//! # User Repository
//!
//! Local accounts: registration, lookup with group membership, profile
//! updates and password authentication.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::OnConflict;

use super::{Page, PageRequest, fetch_page, find_required};
use crate::error::RepositoryError;
use crate::models::{group, user, user_group};
use crate::password;

/// Data for registering a user. The password is plain text here and hashed
/// before it reaches the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_staff: bool,
}

/// Changes accepted by a profile update.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active user with a freshly hashed password.
    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, RepositoryError> {
        self.create_with_iterations(new_user, password::DEFAULT_ITERATIONS)
            .await
    }

    /// Same as [`create`](Self::create) with an explicit hashing work factor.
    pub async fn create_with_iterations(
        &self,
        new_user: NewUser,
        iterations: u32,
    ) -> Result<user::Model, RepositoryError> {
        let password_hash = password::hash_password_with_iterations(&new_user.password, iterations);

        let user = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            is_staff: Set(new_user.is_staff),
            is_active: Set(true),
            ..Default::default()
        };

        let user = user
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    pub async fn get(&self, id: i32) -> Result<user::Model, RepositoryError> {
        find_required::<user::Entity, _>(self.db, id, "User").await
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, RepositoryError> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<user::Model>, RepositoryError> {
        fetch_page(self.db, user::Entity::find(), user::Column::Id, page, |u| u.id).await
    }

    /// Groups the user belongs to, ordered by name.
    pub async fn groups(&self, user: &user::Model) -> Result<Vec<group::Model>, RepositoryError> {
        user.find_related(group::Entity)
            .order_by_asc(group::Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: i32,
        changes: UserChanges,
    ) -> Result<user::Model, RepositoryError> {
        let mut user = self.get(id).await?.into_active_model();

        if let Some(first_name) = changes.first_name {
            user.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = Set(last_name);
        }
        if let Some(email) = changes.email {
            user.email = Set(email);
        }

        user.update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Adds the user to each group; existing memberships are kept.
    pub async fn add_groups(
        &self,
        user_id: i32,
        group_ids: &[i32],
    ) -> Result<Vec<group::Model>, RepositoryError> {
        let user = self.get(user_id).await?;

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;
        for &group_id in group_ids {
            find_required::<group::Entity, _>(&txn, group_id, "Group").await?;
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

        self.groups(&user).await
    }

    /// Checks credentials; inactive accounts never authenticate.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<user::Model>, RepositoryError> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        match password::verify_password(password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(err) => {
                tracing::warn!(user_id = user.id, error = %err, "Stored password hash is unusable");
                Ok(None)
            }
        }
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

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@school.test", username),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "correct-horse".to_string(),
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_activity() {
        let db = setup_test_db().await;
        let repo = UserRepository::new(&db);
        let user = repo
            .create_with_iterations(new_user("ada"), 1_000)
            .await
            .unwrap();

        assert!(repo.authenticate("ada", "correct-horse").await.unwrap().is_some());
        assert!(repo.authenticate("ada", "wrong").await.unwrap().is_none());
        assert!(repo.authenticate("nobody", "correct-horse").await.unwrap().is_none());

        let mut inactive = user.into_active_model();
        inactive.is_active = Set(false);
        inactive.update(&db).await.unwrap();
        assert!(repo.authenticate("ada", "correct-horse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let db = setup_test_db().await;
        let repo = UserRepository::new(&db);
        repo.create_with_iterations(new_user("ada"), 1_000)
            .await
            .unwrap();

        let mut duplicate = new_user("ada");
        duplicate.email = "other@school.test".to_string();
        match repo.create_with_iterations(duplicate, 1_000).await {
            Err(RepositoryError::Database(err)) => {
                assert!(crate::error::is_unique_violation(&err))
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn add_groups_is_idempotent() {
        let db = setup_test_db().await;
        let repo = UserRepository::new(&db);
        let user = repo
            .create_with_iterations(new_user("ada"), 1_000)
            .await
            .unwrap();
        let registrar = group::ActiveModel {
            name: Set("Registrar".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        repo.add_groups(user.id, &[registrar.id]).await.unwrap();
        let groups = repo.add_groups(user.id, &[registrar.id]).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Registrar");

        let missing = repo.add_groups(user.id, &[999]).await.unwrap_err();
        assert!(matches!(missing, RepositoryError::NotFound(_)));
    }
}
