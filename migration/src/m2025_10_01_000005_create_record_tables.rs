//! Migration to create the academic record tables.
//!
//! Teaching assignments, enrollments, attendance marks and grades.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teaches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teaches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teaches::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Teaches::CourseId).integer().not_null())
                    .col(ColumnDef::new(Teaches::SectionId).integer().not_null())
                    .col(ColumnDef::new(Teaches::SemesterId).integer().not_null())
                    .col(ColumnDef::new(Teaches::SchoolYear).integer().not_null())
                    .col(
                        ColumnDef::new(Teaches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaches_teacher_id")
                            .from(Teaches::Table, Teaches::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaches_course_id")
                            .from(Teaches::Table, Teaches::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaches_section_id")
                            .from(Teaches::Table, Teaches::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaches_semester_id")
                            .from(Teaches::Table, Teaches::SemesterId)
                            .to(Semesters::Table, Semesters::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teaches_school_year")
                            .from(Teaches::Table, Teaches::SchoolYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // A section has one teacher per semester
        manager
            .create_index(
                Index::create()
                    .name("idx_teaches_section_semester")
                    .table(Teaches::Table)
                    .col(Teaches::SectionId)
                    .col(Teaches::SemesterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollments::StudentId).integer().not_null())
                    .col(ColumnDef::new(Enrollments::CourseId).integer().not_null())
                    .col(ColumnDef::new(Enrollments::SectionId).integer().not_null())
                    .col(ColumnDef::new(Enrollments::SemesterId).integer().not_null())
                    .col(ColumnDef::new(Enrollments::SchoolYear).integer().not_null())
                    .col(
                        ColumnDef::new(Enrollments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_student_id")
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_course_id")
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_section_id")
                            .from(Enrollments::Table, Enrollments::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_semester_id")
                            .from(Enrollments::Table, Enrollments::SemesterId)
                            .to(Semesters::Table, Semesters::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_school_year")
                            .from(Enrollments::Table, Enrollments::SchoolYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_student_course_semester")
                    .table(Enrollments::Table)
                    .col(Enrollments::StudentId)
                    .col(Enrollments::CourseId)
                    .col(Enrollments::SemesterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attendances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendances::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendances::Mark).string_len(1).not_null())
                    .col(
                        ColumnDef::new(Attendances::Comment)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Attendances::StudentId).integer().not_null())
                    .col(ColumnDef::new(Attendances::CourseId).integer().not_null())
                    .col(ColumnDef::new(Attendances::SectionId).integer().not_null())
                    .col(ColumnDef::new(Attendances::SemesterId).integer().not_null())
                    .col(ColumnDef::new(Attendances::SchoolYear).integer().not_null())
                    .col(
                        ColumnDef::new(Attendances::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Attendances::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_student_id")
                            .from(Attendances::Table, Attendances::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_course_id")
                            .from(Attendances::Table, Attendances::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_section_id")
                            .from(Attendances::Table, Attendances::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_semester_id")
                            .from(Attendances::Table, Attendances::SemesterId)
                            .to(Semesters::Table, Semesters::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_school_year")
                            .from(Attendances::Table, Attendances::SchoolYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grades::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grades::StudentId).integer().not_null())
                    .col(ColumnDef::new(Grades::CourseId).integer().not_null())
                    .col(ColumnDef::new(Grades::SectionId).integer().not_null())
                    .col(ColumnDef::new(Grades::SemesterId).integer().not_null())
                    .col(ColumnDef::new(Grades::SchoolYear).integer().not_null())
                    .col(ColumnDef::new(Grades::TeacherId).integer().not_null())
                    .col(ColumnDef::new(Grades::Quiz).double().not_null())
                    .col(ColumnDef::new(Grades::Assignment).double().not_null())
                    .col(ColumnDef::new(Grades::Attendance).double().not_null())
                    .col(ColumnDef::new(Grades::Project).double().not_null())
                    .col(ColumnDef::new(Grades::MidtermExam).double().not_null())
                    .col(ColumnDef::new(Grades::FinalExam).double().not_null())
                    .col(
                        ColumnDef::new(Grades::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_student_id")
                            .from(Grades::Table, Grades::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_course_id")
                            .from(Grades::Table, Grades::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_section_id")
                            .from(Grades::Table, Grades::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_semester_id")
                            .from(Grades::Table, Grades::SemesterId)
                            .to(Semesters::Table, Semesters::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_school_year")
                            .from(Grades::Table, Grades::SchoolYear)
                            .to(SchoolYears::Table, SchoolYears::Year)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_teacher_id")
                            .from(Grades::Table, Grades::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grades_student_section_semester")
                    .table(Grades::Table)
                    .col(Grades::StudentId)
                    .col(Grades::SectionId)
                    .col(Grades::SemesterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Grades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teaches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Teaches {
    Table,
    Id,
    TeacherId,
    CourseId,
    SectionId,
    SemesterId,
    SchoolYear,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    StudentId,
    CourseId,
    SectionId,
    SemesterId,
    SchoolYear,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Attendances {
    Table,
    Id,
    Mark,
    Comment,
    StudentId,
    CourseId,
    SectionId,
    SemesterId,
    SchoolYear,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Grades {
    Table,
    Id,
    StudentId,
    CourseId,
    SectionId,
    SemesterId,
    SchoolYear,
    TeacherId,
    Quiz,
    Assignment,
    Attendance,
    Project,
    MidtermExam,
    FinalExam,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Teachers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Sections {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Semesters {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SchoolYears {
    Table,
    Year,
}
