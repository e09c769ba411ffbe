//! Migration: Create classes and subjects tables.

use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(uuid(Classes::Id).primary_key())
                    .col(string_len(Classes::Name, 100))
                    .col(string_null(Classes::Section))
                    .col(string_null(Classes::AcademicYear))
                    .col(timestamp_with_time_zone(Classes::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(uuid(Subjects::Id).primary_key())
                    .col(string_len(Subjects::Name, 100))
                    .col(string_len(Subjects::Code, 30))
                    .col(uuid(Subjects::ClassId))
                    .col(timestamp_with_time_zone(Subjects::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subjects_class")
                            .from(Subjects::Table, Subjects::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subjects_class_id")
                    .table(Subjects::Table)
                    .col(Subjects::ClassId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subjects::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Classes {
    Table,
    Id,
    Name,
    Section,
    AcademicYear,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Subjects {
    Table,
    Id,
    Name,
    Code,
    ClassId,
    CreatedAt,
}
