use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Generics::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Generics::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Generics::Name).string().not_null())
                    .col(ColumnDef::new(Generics::Description).text().not_null())
                    .col(
                        ColumnDef::new(Generics::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Generics::Status).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Generics::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Generics {
    Table,
    Id,
    Name,
    Description,
    Date,
    Status,
}
