use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectRecords::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::Title)
                            .string()
                            .not_null()
                            .default("Untitled Project"),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::Company)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::Customer)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectRecords::ProjectDate).date().not_null())
                    .col(
                        ColumnDef::new(ProjectRecords::Status)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectRecords::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ProjectRecords::Year).integer().not_null())
                    .col(
                        ColumnDef::new(ProjectRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProjectRecords {
    Table,
    Id,
    Title,
    Description,
    Company,
    Customer,
    Amount,
    ProjectDate,
    Status,
    IsActive,
    Year,
    CreatedAt,
}
