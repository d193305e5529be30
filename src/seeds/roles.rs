//! Role group seeding
//!
//! Every [`Role`] gets a group of the same name holding the role's
//! permissions. Seeding is idempotent: existing groups and permissions are
//! reused and only missing links are added.

use anyhow::Result;
use sea_orm::DatabaseConnection;

use crate::permissions::Role;
use crate::repositories::{GroupRepository, PermissionRepository};

/// Creates the role groups and their permissions if they are missing.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<()> {
    let groups = GroupRepository::new(db);
    let permissions = PermissionRepository::new(db);

    for role in Role::ALL {
        let group = match groups.find_by_name(role.group_name()).await? {
            Some(group) => {
                log::info!("Group '{}' already exists, skipping", group.name);
                group
            }
            None => {
                let group = groups.create(role.group_name().to_string()).await?;
                log::info!("Created group '{}'", group.name);
                group
            }
        };

        let mut permission_ids: Vec<i32> = groups
            .permissions(&group)
            .await?
            .into_iter()
            .map(|permission| permission.id)
            .collect();

        for (name, codename) in role.permissions() {
            let permission = match permissions.find_by_codename(codename).await? {
                Some(permission) => permission,
                None => {
                    log::info!("Created permission '{}'", codename);
                    permissions.create(name, codename).await?
                }
            };
            if !permission_ids.contains(&permission.id) {
                permission_ids.push(permission.id);
            }
        }

        groups.set_permissions(group.id, &permission_ids).await?;
    }

    log::info!("Role groups seeded");
    Ok(())
}
