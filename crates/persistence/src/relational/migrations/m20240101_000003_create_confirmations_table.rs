//! Migration: Create confirmations table.
//!
//! Searches filter on rut / phone number within a date range, so those
//! columns are indexed.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Confirmations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Confirmations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Confirmations::SessionId).string().null().unique_key())
                    .col(ColumnDef::new(Confirmations::AppointmentId).string().null())
                    .col(ColumnDef::new(Confirmations::PatientName).string().not_null())
                    .col(ColumnDef::new(Confirmations::Rut).string().not_null())
                    .col(ColumnDef::new(Confirmations::PhoneNumber).string().not_null())
                    .col(ColumnDef::new(Confirmations::ServiceName).string().not_null())
                    .col(ColumnDef::new(Confirmations::CenterName).string().null())
                    .col(
                        ColumnDef::new(Confirmations::CreatedDatetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Confirmations::StartDatetime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Confirmations::AppointmentDatetime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Confirmations::DeliveredDatetime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Confirmations::TemplateId).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_confirmations_rut_created")
                    .table(Confirmations::Table)
                    .col(Confirmations::Rut)
                    .col(Confirmations::CreatedDatetime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_confirmations_phone_created")
                    .table(Confirmations::Table)
                    .col(Confirmations::PhoneNumber)
                    .col(Confirmations::CreatedDatetime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Confirmations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Confirmations {
    Table,
    Id,
    SessionId,
    AppointmentId,
    PatientName,
    Rut,
    PhoneNumber,
    ServiceName,
    CenterName,
    CreatedDatetime,
    StartDatetime,
    AppointmentDatetime,
    DeliveredDatetime,
    TemplateId,
}
