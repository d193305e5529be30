//! Adds lookup indexes for roster and per-student record queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Section rosters are read per (section, semester) by attendance and grade upload
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enrollments_section_semester")
                    .table(Enrollments::Table)
                    .col(Enrollments::SectionId)
                    .col(Enrollments::SemesterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_grades_section_semester")
                    .table(Grades::Table)
                    .col(Grades::SectionId)
                    .col(Grades::SemesterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendances_student_id")
                    .table(Attendances::Table)
                    .col(Attendances::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_attendances_student_id")
                    .table(Attendances::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_grades_section_semester")
                    .table(Grades::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_enrollments_section_semester")
                    .table(Enrollments::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    SectionId,
    SemesterId,
}

#[derive(DeriveIden)]
enum Grades {
    Table,
    SectionId,
    SemesterId,
}

#[derive(DeriveIden)]
enum Attendances {
    Table,
    StudentId,
}
