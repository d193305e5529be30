//! Administrator bootstrap

use anyhow::{Context, Result, bail};
use sea_orm::DatabaseConnection;

use crate::permissions::Role;
use crate::repositories::{GroupRepository, NewUser, UserRepository};
use crate::validators::{self, FieldErrors};

/// Creates a staff account in the `Admin` group.
///
/// Role groups must already exist; run [`seed_roles`](super::seed_roles)
/// first.
pub async fn create_superuser(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let mut errors = FieldErrors::new();
    errors
        .check("username", validators::username(username))
        .check("email", validators::email(email))
        .check("password", validators::password(password));
    if !errors.is_empty() {
        bail!("invalid superuser details: {:?}", errors);
    }

    let users = UserRepository::new(db);
    if users.find_by_username(username).await?.is_some() {
        bail!("user '{}' already exists", username);
    }

    let admin_group = GroupRepository::new(db)
        .find_by_name(Role::Admin.group_name())
        .await?
        .context("Admin group missing; run the seed command first")?;

    let user = users
        .create(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            password: password.to_string(),
            is_staff: true,
        })
        .await?;
    users.add_groups(user.id, &[admin_group.id]).await?;

    log::info!("Created superuser '{}'", user.username);
    Ok(())
}
