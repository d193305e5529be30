//! Migration to create the organization tables.
//!
//! Addresses, departments, majors, buildings, offices and classrooms.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Addresses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Addresses::Street).string_len(255).not_null())
                    .col(ColumnDef::new(Addresses::City).string_len(150).not_null())
                    .col(ColumnDef::new(Addresses::Province).string_len(150).not_null())
                    .col(ColumnDef::new(Addresses::PostalCode).string_len(20).not_null())
                    .col(ColumnDef::new(Addresses::Country).string_len(100).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Departments::Name)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Departments::Budget).double().not_null())
                    .col(ColumnDef::new(Departments::Duty).text().not_null())
                    .col(
                        ColumnDef::new(Departments::AddressId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Departments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Departments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_departments_address_id")
                            .from(Departments::Table, Departments::AddressId)
                            .to(Addresses::Table, Addresses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Majors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Majors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Majors::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Majors::DepartmentId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_majors_department_id")
                            .from(Majors::Table, Majors::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_majors_name_department")
                    .table(Majors::Table)
                    .col(Majors::Name)
                    .col(Majors::DepartmentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Buildings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Buildings::Name)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Buildings::AddressId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_buildings_address_id")
                            .from(Buildings::Table, Buildings::AddressId)
                            .to(Addresses::Table, Addresses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Offices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Offices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Offices::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Offices::BuildingId).integer().not_null())
                    .col(ColumnDef::new(Offices::DepartmentId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offices_building_id")
                            .from(Offices::Table, Offices::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_offices_department_id")
                            .from(Offices::Table, Offices::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offices_name_building")
                    .table(Offices::Table)
                    .col(Offices::Name)
                    .col(Offices::BuildingId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classrooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classrooms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Classrooms::Name)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Classrooms::Dimension).string_len(150).not_null())
                    .col(ColumnDef::new(Classrooms::BuildingId).integer().not_null())
                    .col(
                        ColumnDef::new(Classrooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Classrooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classrooms_building_id")
                            .from(Classrooms::Table, Classrooms::BuildingId)
                            .to(Buildings::Table, Buildings::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Classrooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Offices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Buildings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Majors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    Id,
    Street,
    City,
    Province,
    PostalCode,
    Country,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Name,
    Budget,
    Duty,
    AddressId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Majors {
    Table,
    Id,
    Name,
    DepartmentId,
}

#[derive(DeriveIden)]
enum Buildings {
    Table,
    Id,
    Name,
    AddressId,
}

#[derive(DeriveIden)]
enum Offices {
    Table,
    Id,
    Name,
    BuildingId,
    DepartmentId,
}

#[derive(DeriveIden)]
enum Classrooms {
    Table,
    Id,
    Name,
    Dimension,
    BuildingId,
    CreatedAt,
    UpdatedAt,
}
