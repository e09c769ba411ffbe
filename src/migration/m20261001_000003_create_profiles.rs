//! Migration: Create teacher and student profiles plus teacher assignments.

use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use super::m20261001_000001_create_users::Users;
use super::m20261001_000002_create_classes_subjects::{Classes, Subjects};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teachers::Table)
                    .if_not_exists()
                    .col(uuid(Teachers::Id).primary_key())
                    .col(uuid(Teachers::UserId).unique_key())
                    .col(timestamp_with_time_zone(Teachers::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teachers_user")
                            .from(Teachers::Table, Teachers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeacherSubjects::Table)
                    .if_not_exists()
                    .col(uuid(TeacherSubjects::TeacherId))
                    .col(uuid(TeacherSubjects::SubjectId))
                    .primary_key(
                        Index::create()
                            .col(TeacherSubjects::TeacherId)
                            .col(TeacherSubjects::SubjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_subjects_teacher")
                            .from(TeacherSubjects::Table, TeacherSubjects::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_subjects_subject")
                            .from(TeacherSubjects::Table, TeacherSubjects::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TeacherClasses::Table)
                    .if_not_exists()
                    .col(uuid(TeacherClasses::TeacherId))
                    .col(uuid(TeacherClasses::ClassId))
                    .primary_key(
                        Index::create()
                            .col(TeacherClasses::TeacherId)
                            .col(TeacherClasses::ClassId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_classes_teacher")
                            .from(TeacherClasses::Table, TeacherClasses::TeacherId)
                            .to(Teachers::Table, Teachers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_classes_class")
                            .from(TeacherClasses::Table, TeacherClasses::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(uuid(Students::Id).primary_key())
                    .col(uuid(Students::UserId).unique_key())
                    .col(uuid(Students::ClassId))
                    .col(string_len(Students::RollNumber, 50))
                    .col(string_null(Students::ParentName))
                    .col(string_null(Students::ParentPhone))
                    .col(timestamp_with_time_zone(Students::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_user")
                            .from(Students::Table, Students::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_class")
                            .from(Students::Table, Students::ClassId)
                            .to(Classes::Table, Classes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_class_id")
                    .table(Students::Table)
                    .col(Students::ClassId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Students::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherClasses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherSubjects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teachers::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Teachers {
    Table,
    Id,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeacherSubjects {
    Table,
    TeacherId,
    SubjectId,
}

#[derive(DeriveIden)]
enum TeacherClasses {
    Table,
    TeacherId,
    ClassId,
}

#[derive(DeriveIden)]
pub enum Students {
    Table,
    Id,
    UserId,
    ClassId,
    RollNumber,
    ParentName,
    ParentPhone,
    CreatedAt,
}
