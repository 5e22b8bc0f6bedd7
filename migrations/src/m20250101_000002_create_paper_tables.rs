use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_companies_and_clients::{Clients, Companies};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaperEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaperEntries::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaperEntries::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(PaperEntries::ClientId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaperEntries::PaperNumber)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaperEntries::Date).date().not_null())
                    .col(
                        ColumnDef::new(PaperEntries::TaxPercentage)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PaperEntries::Subtotal)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PaperEntries::TaxAmount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PaperEntries::Total)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PaperEntries::PreparedBy).string().null())
                    .col(ColumnDef::new(PaperEntries::DeliveredBy).string().null())
                    .col(ColumnDef::new(PaperEntries::ReceivedBy).string().null())
                    .col(
                        ColumnDef::new(PaperEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paper_entries_company_id")
                            .from(PaperEntries::Table, PaperEntries::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paper_entries_client_id")
                            .from(PaperEntries::Table, PaperEntries::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaperItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaperItems::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaperItems::EntryId).uuid().not_null())
                    .col(ColumnDef::new(PaperItems::Position).integer().not_null())
                    .col(ColumnDef::new(PaperItems::Description).text().not_null())
                    .col(
                        ColumnDef::new(PaperItems::Quantity)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaperItems::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaperItems::Amount)
                            .decimal_len(14, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paper_items_entry_id")
                            .from(PaperItems::Table, PaperItems::EntryId)
                            .to(PaperEntries::Table, PaperEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One counter row per (company, year); last_value only ever grows.
        manager
            .create_table(
                Table::create()
                    .table(PaperSequences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PaperSequences::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(PaperSequences::Year).integer().not_null())
                    .col(
                        ColumnDef::new(PaperSequences::LastValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_paper_sequences")
                            .col(PaperSequences::CompanyId)
                            .col(PaperSequences::Year),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paper_sequences_company_id")
                            .from(PaperSequences::Table, PaperSequences::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaperSequences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaperItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaperEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PaperEntries {
    Table,
    Id,
    CompanyId,
    ClientId,
    PaperNumber,
    Date,
    TaxPercentage,
    Subtotal,
    TaxAmount,
    Total,
    PreparedBy,
    DeliveredBy,
    ReceivedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PaperItems {
    Table,
    Id,
    EntryId,
    Position,
    Description,
    Quantity,
    UnitPrice,
    Amount,
}

#[derive(DeriveIden)]
enum PaperSequences {
    Table,
    CompanyId,
    Year,
    LastValue,
}
