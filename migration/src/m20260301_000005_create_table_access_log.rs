use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessLog::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessLog::FileId).uuid().not_null())
                    .col(ColumnDef::new(AccessLog::UserId).uuid())
                    .col(
                        ColumnDef::new(AccessLog::AccessType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessLog::Ip).string_len(64))
                    .col(ColumnDef::new(AccessLog::UserAgent).text())
                    .col(ColumnDef::new(AccessLog::Device).string_len(64))
                    .col(ColumnDef::new(AccessLog::Success).boolean().not_null())
                    .col(
                        ColumnDef::new(AccessLog::Bytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AccessLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX idx_access_log_file_time
                ON access_log (file_id, created_at DESC);
                "#,
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccessLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessLog {
    Table,
    Id,
    FileId,
    UserId,
    AccessType,
    Ip,
    UserAgent,
    Device,
    Success,
    Bytes,
    CreatedAt,
}
