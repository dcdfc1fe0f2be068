use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StorageStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StorageStats::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StorageStats::TotalBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StorageStats::TotalFiles)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(StorageStats::ImageBytes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::ImageCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::VideoBytes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::VideoCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::AudioBytes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::AudioCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::DocumentBytes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::DocumentCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::OtherBytes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(StorageStats::OtherCount).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(StorageStats::StorageQuotaBytes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StorageStats::StorageUsedPercentage)
                            .double()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StorageStats::LastCalculatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StorageStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StorageStats {
    Table,
    UserId,
    TotalBytes,
    TotalFiles,
    ImageBytes,
    ImageCount,
    VideoBytes,
    VideoCount,
    AudioBytes,
    AudioCount,
    DocumentBytes,
    DocumentCount,
    OtherBytes,
    OtherCount,
    StorageQuotaBytes,
    StorageUsedPercentage,
    LastCalculatedAt,
}
