use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_companies_and_clients::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenders::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Tenders::TenderNo)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Tenders::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Tenders::ClientName).string().not_null())
                    .col(
                        ColumnDef::new(Tenders::TotalValue)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tenders::PaymentStatus)
                            .string_len(50)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Tenders::StartDate).date().null())
                    .col(ColumnDef::new(Tenders::EndDate).date().null())
                    .col(
                        ColumnDef::new(Tenders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenders_company_id")
                            .from(Tenders::Table, Tenders::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Expenses::TenderId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).text().null())
                    .col(
                        ColumnDef::new(Expenses::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Date).date().not_null())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expenses_tender_id")
                            .from(Expenses::Table, Expenses::TenderId)
                            .to(Tenders::Table, Tenders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Payments::TenderId).uuid().not_null())
                    .col(
                        ColumnDef::new(Payments::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::Date).date().not_null())
                    .col(ColumnDef::new(Payments::Note).text().null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_tender_id")
                            .from(Payments::Table, Payments::TenderId)
                            .to(Tenders::Table, Tenders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tenders {
    Table,
    Id,
    TenderNo,
    CompanyId,
    ClientName,
    TotalValue,
    PaymentStatus,
    StartDate,
    EndDate,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Expenses {
    Table,
    Id,
    TenderId,
    Category,
    Description,
    Amount,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Payments {
    Table,
    Id,
    TenderId,
    Amount,
    Date,
    Note,
    CreatedAt,
}
