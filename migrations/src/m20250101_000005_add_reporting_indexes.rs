use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_paper_tables::PaperEntries;
use super::m20250101_000003_create_project_records_table::ProjectRecords;
use super::m20250101_000004_create_tender_tables::{Expenses, Payments, Tenders};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Document listing, newest first per company
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_paper_entries_company_created")
                    .table(PaperEntries::Table)
                    .col(PaperEntries::CompanyId)
                    .col((PaperEntries::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Projection dashboard scans active rows by date
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_project_records_active_date")
                    .table(ProjectRecords::Table)
                    .col(ProjectRecords::IsActive)
                    .col((ProjectRecords::ProjectDate, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_project_records_company_year")
                    .table(ProjectRecords::Table)
                    .col(ProjectRecords::Company)
                    .col(ProjectRecords::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tenders_company_status")
                    .table(Tenders::Table)
                    .col(Tenders::CompanyId)
                    .col(Tenders::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_expenses_tender_date")
                    .table(Expenses::Table)
                    .col(Expenses::TenderId)
                    .col((Expenses::Date, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_tender_id")
                    .table(Payments::Table)
                    .col(Payments::TenderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let indexes = [
            ("idx_payments_tender_id", Payments::Table.into_iden()),
            ("idx_expenses_tender_date", Expenses::Table.into_iden()),
            ("idx_tenders_company_status", Tenders::Table.into_iden()),
            (
                "idx_project_records_company_year",
                ProjectRecords::Table.into_iden(),
            ),
            (
                "idx_project_records_active_date",
                ProjectRecords::Table.into_iden(),
            ),
            (
                "idx_paper_entries_company_created",
                PaperEntries::Table.into_iden(),
            ),
        ];

        for (name, table) in indexes {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}
