pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_companies_and_clients;
mod m20250101_000002_create_paper_tables;
mod m20250101_000003_create_project_records_table;
mod m20250101_000004_create_tender_tables;
mod m20250101_000005_add_reporting_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_companies_and_clients::Migration),
            Box::new(m20250101_000002_create_paper_tables::Migration),
            Box::new(m20250101_000003_create_project_records_table::Migration),
            Box::new(m20250101_000004_create_tender_tables::Migration),
            Box::new(m20250101_000005_add_reporting_indexes::Migration),
        ]
    }
}
