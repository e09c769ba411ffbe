//! Migration: Create exams and grades tables.

use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use super::m20261001_000002_create_classes_subjects::{Classes, Subjects};
use super::m20261001_000003_create_profiles::Students;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(uuid(Exams::Id).primary_key())
                    .col(string_len(Exams::Title, 200))
                    .col(uuid(Exams::SubjectId))
                    .col(uuid(Exams::ClassId))
                    // ExamType enum is represented in app code: midterm, final, assignment
                    .col(string_len(Exams::ExamType, 20))
                    // Term enum is represented in app code: term1, term2, final
                    .col(string_len(Exams::Term, 20))
                    .col(double(Exams::MaxMarks).check(Expr::col(Exams::MaxMarks).gt(0)))
                    .col(timestamp_with_time_zone_null(Exams::ExamDate))
                    .col(boolean(Exams::IsPublished).default(false))
                    .col(uuid(Exams::CreatedBy))
                    .col(timestamp_with_time_zone(Exams::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_subject")
                            .from(Exams::Table, Exams::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_class")
                            .from(Exams::Table, Exams::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(uuid(Grades::Id).primary_key())
                    .col(uuid(Grades::StudentId))
                    .col(uuid(Grades::ClassId))
                    .col(uuid(Grades::SubjectId))
                    .col(uuid_null(Grades::TeacherId))
                    .col(uuid_null(Grades::ExamId))
                    .col(string_len(Grades::Term, 20))
                    .col(string_len(Grades::ExamType, 20))
                    .col(double(Grades::Marks).check(Expr::col(Grades::Marks).gte(0)))
                    .col(double(Grades::MaxMarks).check(Expr::col(Grades::MaxMarks).gt(0)))
                    .col(double(Grades::Percentage))
                    .col(string_len(Grades::Grade, 2))
                    .col(text_null(Grades::Remarks))
                    .col(timestamp_with_time_zone(Grades::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Grades::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_student")
                            .from(Grades::Table, Grades::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_subject")
                            .from(Grades::Table, Grades::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_exam")
                            .from(Grades::Table, Grades::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Teacher view: one subject in one class, optionally one term
        manager
            .create_index(
                Index::create()
                    .name("idx_grades_subject_class_term")
                    .table(Grades::Table)
                    .col(Grades::SubjectId)
                    .col(Grades::ClassId)
                    .col(Grades::Term)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grades_student_id")
                    .table(Grades::Table)
                    .col(Grades::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grades_exam_id")
                    .table(Grades::Table)
                    .col(Grades::ExamId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Grades::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Exams {
    Table,
    Id,
    Title,
    SubjectId,
    ClassId,
    ExamType,
    Term,
    MaxMarks,
    ExamDate,
    IsPublished,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Grades {
    Table,
    Id,
    StudentId,
    ClassId,
    SubjectId,
    TeacherId,
    ExamId,
    Term,
    ExamType,
    Marks,
    MaxMarks,
    Percentage,
    Grade,
    Remarks,
    CreatedAt,
    UpdatedAt,
}
