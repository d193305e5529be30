//! Migration to create the person profile tables.
//!
//! Employees, teachers and students each extend exactly one user.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Employees::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employees::DepartmentId).integer().not_null())
                    .col(ColumnDef::new(Employees::OfficeId).integer().null())
                    .col(ColumnDef::new(Employees::JobTitle).string_len(150).not_null())
                    .col(ColumnDef::new(Employees::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Employees::BirthDate).date().not_null())
                    .col(ColumnDef::new(Employees::Gender).string_len(1).not_null())
                    .col(ColumnDef::new(Employees::HireDate).date().not_null())
                    .col(ColumnDef::new(Employees::Image).string_len(255).null())
                    .col(
                        ColumnDef::new(Employees::AddressId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_user_id")
                            .from(Employees::Table, Employees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_department_id")
                            .from(Employees::Table, Employees::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_office_id")
                            .from(Employees::Table, Employees::OfficeId)
                            .to(Offices::Table, Offices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_address_id")
                            .from(Employees::Table, Employees::AddressId)
                            .to(Addresses::Table, Addresses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teachers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Teachers::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Teachers::DepartmentId).integer().not_null())
                    .col(
                        ColumnDef::new(Teachers::Specialization)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Teachers::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Teachers::BirthDate).date().not_null())
                    .col(ColumnDef::new(Teachers::Gender).string_len(1).not_null())
                    .col(ColumnDef::new(Teachers::HireDate).date().not_null())
                    .col(ColumnDef::new(Teachers::Image).string_len(255).null())
                    .col(
                        ColumnDef::new(Teachers::AddressId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Teachers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Teachers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teachers_user_id")
                            .from(Teachers::Table, Teachers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teachers_department_id")
                            .from(Teachers::Table, Teachers::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teachers_address_id")
                            .from(Teachers::Table, Teachers::AddressId)
                            .to(Addresses::Table, Addresses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Students::StudentNumber)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::MajorId).integer().not_null())
                    .col(ColumnDef::new(Students::YearLevel).integer().not_null())
                    .col(
                        ColumnDef::new(Students::IsTransferStudent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Students::AdmissionYear).integer().not_null())
                    .col(ColumnDef::new(Students::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Students::BirthDate).date().not_null())
                    .col(ColumnDef::new(Students::Gender).string_len(1).not_null())
                    .col(ColumnDef::new(Students::Image).string_len(255).null())
                    .col(ColumnDef::new(Students::Tor).string_len(255).null())
                    .col(
                        ColumnDef::new(Students::AddressId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Students::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Students::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_user_id")
                            .from(Students::Table, Students::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_major_id")
                            .from(Students::Table, Students::MajorId)
                            .to(Majors::Table, Majors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_admission_year")
                            .from(Students::Table, Students::AdmissionYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_address_id")
                            .from(Students::Table, Students::AddressId)
                            .to(Addresses::Table, Addresses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    UserId,
    DepartmentId,
    OfficeId,
    JobTitle,
    Phone,
    BirthDate,
    Gender,
    HireDate,
    Image,
    AddressId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Teachers {
    Table,
    Id,
    UserId,
    DepartmentId,
    Specialization,
    Phone,
    BirthDate,
    Gender,
    HireDate,
    Image,
    AddressId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    UserId,
    StudentNumber,
    MajorId,
    YearLevel,
    IsTransferStudent,
    AdmissionYear,
    Phone,
    BirthDate,
    Gender,
    Image,
    Tor,
    AddressId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Offices {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Majors {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SchoolYears {
    Table,
    Year,
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    Id,
}
