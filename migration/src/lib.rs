pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_table_files;
mod m20260301_000002_create_table_albums;
mod m20260301_000003_create_table_album_files;
mod m20260301_000004_create_table_shares;
mod m20260301_000005_create_table_access_log;
mod m20260301_000006_create_table_storage_stats;
mod m20260301_000007_create_table_processing_queue;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_table_files::Migration),
            Box::new(m20260301_000002_create_table_albums::Migration),
            Box::new(m20260301_000003_create_table_album_files::Migration),
            Box::new(m20260301_000004_create_table_shares::Migration),
            Box::new(m20260301_000005_create_table_access_log::Migration),
            Box::new(m20260301_000006_create_table_storage_stats::Migration),
            Box::new(m20260301_000007_create_table_processing_queue::Migration),
        ]
    }
}
