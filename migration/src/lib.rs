//! Database migrations for the School Administration API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_10_01_000001_create_identity_tables;
mod m2025_10_01_000002_create_organization_tables;
mod m2025_10_01_000003_create_curriculum_tables;
mod m2025_10_01_000004_create_profile_tables;
mod m2025_10_01_000005_create_record_tables;
mod m2025_10_02_000001_add_record_lookup_indexes;
mod m2025_10_02_000002_add_single_current_semester_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_10_01_000001_create_identity_tables::Migration),
            Box::new(m2025_10_01_000002_create_organization_tables::Migration),
            Box::new(m2025_10_01_000003_create_curriculum_tables::Migration),
            Box::new(m2025_10_01_000004_create_profile_tables::Migration),
            Box::new(m2025_10_01_000005_create_record_tables::Migration),
            Box::new(m2025_10_02_000001_add_record_lookup_indexes::Migration),
            Box::new(m2025_10_02_000002_add_single_current_semester_guard::Migration),
        ]
    }
}
