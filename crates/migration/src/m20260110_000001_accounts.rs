//! Accounts: where a user keeps money (cash, bank, card, wallet, ...).
//!
//! `balance_minor` is denormalized and only ever changed by the engine through
//! `balance_minor = balance_minor + delta` updates.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub(crate) enum Accounts {
    Table,
    Id,
    OwnerId,
    Name,
    Kind,
    BalanceMinor,
    Color,
    Currency,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::OwnerId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Kind)
                            .string()
                            .not_null()
                            .default("bank"),
                    )
                    .col(
                        ColumnDef::new(Accounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::Color)
                            .string()
                            .not_null()
                            .default("#3B82F6"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Currency)
                            .string()
                            .not_null()
                            .default("INR"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Name reuse is blocked regardless of the active flag.
        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner_id-name-unique")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner_id-active-created_at")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .col(Accounts::Active)
                    .col(Accounts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}
