//! Migration to create the curriculum tables.
//!
//! School years, semesters, class times, courses and sections.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchoolYears::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolYears::Year)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Semesters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Semesters::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Semesters::Term).string_len(10).not_null())
                    .col(ColumnDef::new(Semesters::SchoolYear).integer().not_null())
                    .col(
                        ColumnDef::new(Semesters::IsCurrent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_semesters_school_year")
                            .from(Semesters::Table, Semesters::SchoolYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_semesters_term_school_year")
                    .table(Semesters::Table)
                    .col(Semesters::Term)
                    .col(Semesters::SchoolYear)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classtimes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classtimes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classtimes::StartTime).string_len(7).not_null())
                    .col(ColumnDef::new(Classtimes::EndTime).string_len(7).not_null())
                    .col(ColumnDef::new(Classtimes::WeekDays).string_len(6).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_classtimes_slot")
                    .table(Classtimes::Table)
                    .col(Classtimes::StartTime)
                    .col(Classtimes::EndTime)
                    .col(Classtimes::WeekDays)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Courses::Code)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Courses::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Courses::Description).text().not_null())
                    .col(ColumnDef::new(Courses::Units).integer().not_null())
                    .col(ColumnDef::new(Courses::DepartmentId).integer().not_null())
                    .col(ColumnDef::new(Courses::PrerequisiteId).integer().null())
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Courses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_department_id")
                            .from(Courses::Table, Courses::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_courses_prerequisite_id")
                            .from(Courses::Table, Courses::PrerequisiteId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sections::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sections::Name).string_len(2).not_null())
                    .col(ColumnDef::new(Sections::CourseId).integer().not_null())
                    .col(ColumnDef::new(Sections::ClassroomId).integer().not_null())
                    .col(ColumnDef::new(Sections::ClasstimeId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sections_course_id")
                            .from(Sections::Table, Sections::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sections_classroom_id")
                            .from(Sections::Table, Sections::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sections_classtime_id")
                            .from(Sections::Table, Sections::ClasstimeId)
                            .to(Classtimes::Table, Classtimes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One section per room per time slot
        manager
            .create_index(
                Index::create()
                    .name("idx_sections_classroom_classtime")
                    .table(Sections::Table)
                    .col(Sections::ClassroomId)
                    .col(Sections::ClasstimeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sections_name_course")
                    .table(Sections::Table)
                    .col(Sections::Name)
                    .col(Sections::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classtimes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Semesters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolYears::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SchoolYears {
    Table,
    Year,
}

#[derive(DeriveIden)]
enum Semesters {
    Table,
    Id,
    Term,
    SchoolYear,
    IsCurrent,
}

#[derive(DeriveIden)]
enum Classtimes {
    Table,
    Id,
    StartTime,
    EndTime,
    WeekDays,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Code,
    Title,
    Description,
    Units,
    DepartmentId,
    PrerequisiteId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sections {
    Table,
    Id,
    Name,
    CourseId,
    ClassroomId,
    ClasstimeId,
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Classrooms {
    Table,
    Id,
}
