//! Migration: Create messages table.
//!
//! Messages belong to a confirmation and are removed with it.

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_confirmations_table::Confirmations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Messages::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Messages::ConfirmationId).string().not_null())
                    .col(ColumnDef::new(Messages::Sender).string().not_null())
                    .col(ColumnDef::new(Messages::MessageText).text().null())
                    .col(ColumnDef::new(Messages::TemplateId).string().null())
                    .col(ColumnDef::new(Messages::TemplateText).text().null())
                    .col(ColumnDef::new(Messages::Variables).json().null())
                    .col(ColumnDef::new(Messages::Status).string().null())
                    .col(
                        ColumnDef::new(Messages::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Messages::ExternalId).string().null().unique_key())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_confirmation")
                            .from(Messages::Table, Messages::ConfirmationId)
                            .to(Confirmations::Table, Confirmations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_messages_confirmation_timestamp")
                    .table(Messages::Table)
                    .col(Messages::ConfirmationId)
                    .col(Messages::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Messages {
    Table,
    Id,
    ConfirmationId,
    Sender,
    MessageText,
    TemplateId,
    TemplateText,
    Variables,
    Status,
    Timestamp,
    ExternalId,
}
