use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            r#"
            DO $$
            BEGIN
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'share_access_type') THEN
                    CREATE TYPE share_access_type AS ENUM ('view', 'download', 'edit');
                END IF;
            END$$;
            "#,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shares::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Shares::FileId).uuid().not_null())
                    .col(ColumnDef::new(Shares::SharedByUserId).uuid().not_null())
                    .col(ColumnDef::new(Shares::SharedWithUserId).uuid())
                    .col(ColumnDef::new(Shares::SharedWithConversationId).uuid())
                    .col(ColumnDef::new(Shares::ShareToken).char_len(64).not_null())
                    .col(
                        ColumnDef::new(Shares::AccessType)
                            .custom(Alias::new("share_access_type"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shares::PasswordHash).text())
                    .col(ColumnDef::new(Shares::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Shares::MaxViews).integer())
                    .col(
                        ColumnDef::new(Shares::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Shares::DownloadCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Shares::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Shares::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Shares::RevokedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shares_file")
                            .from(Shares::Table, Shares::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Token uniqueness, restricted to active shares for fast token resolution.
        conn.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX idx_shares_token_active
            ON shares (share_token)
            WHERE is_active;
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE INDEX idx_shares_file
            ON shares (file_id);
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shares::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS share_access_type")
            .await
    }
}

#[derive(DeriveIden)]
enum Shares {
    Table,
    Id,
    FileId,
    SharedByUserId,
    SharedWithUserId,
    SharedWithConversationId,
    ShareToken,
    AccessType,
    PasswordHash,
    ExpiresAt,
    MaxViews,
    ViewCount,
    DownloadCount,
    IsActive,
    CreatedAt,
    RevokedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
}
