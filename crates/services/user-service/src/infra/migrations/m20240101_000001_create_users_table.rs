//! Migration: Create users table.

use domain::VALID_ROLES;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await?;

        // Index for efficient filtering of active users
        manager
            .create_index(
                Index::create()
                    .name("idx_users_is_deleted")
                    .table(Users::Table)
                    .col(Users::IsDeleted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Users::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        // Soft-deleted rows are renamed, so names stay unique across history
        .col(ColumnDef::new(Users::UserName).string().not_null().unique_key())
        .col(ColumnDef::new(Users::FirstName).string().not_null())
        .col(ColumnDef::new(Users::LastName).string().not_null())
        .col(ColumnDef::new(Users::Credential).string().not_null())
        .col(
            ColumnDef::new(Users::Enabled)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(Users::IsDeleted)
                .boolean()
                .not_null()
                .default(false),
        )
        // Only the canonical role descriptions can be stored
        .col(
            ColumnDef::new(Users::Role)
                .string()
                .not_null()
                .check(Expr::col(Users::Role).is_in(VALID_ROLES.iter().copied())),
        )
        .col(
            ColumnDef::new(Users::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(Users::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .to_owned()
}

#[derive(Iden)]
pub(super) enum Users {
    Table,
    Id,
    UserName,
    FirstName,
    LastName,
    Credential,
    Enabled,
    IsDeleted,
    Role,
    CreatedAt,
    UpdatedAt,
}
