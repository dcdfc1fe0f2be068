//! # Files Table Migration
//!
//! `files` is the single source of truth for uploaded blobs. Every other
//! media table hangs off this one: `album_files` and `shares` reference
//! `files.id`.
//!
//! ## Dedup invariant
//! The partial unique index on `(content_hash) WHERE deleted_at IS NULL`
//! closes the concurrent-insert race: two ingests racing the dedup probe
//! converge on one canonical row because the database itself refuses a
//! second live row with the same hash.
//!
//! ## Ownership listing
//! `idx_files_owner_active` backs `ListFilesByUser` and the live-aggregate
//! quota query, both of which filter on `deleted_at IS NULL`.

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
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'file_category') THEN
                    CREATE TYPE file_category AS ENUM ('image', 'video', 'audio', 'document', 'other');
                END IF;
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'processing_status') THEN
                    CREATE TYPE processing_status AS ENUM ('pending', 'processing', 'completed', 'failed');
                END IF;
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'file_visibility') THEN
                    CREATE TYPE file_visibility AS ENUM ('private', 'public', 'unlisted');
                END IF;
            END$$;
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_updated_at_column()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = CURRENT_TIMESTAMP;
                RETURN NEW;
            END;
            $$ language 'plpgsql';
            "#,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Files::UploaderUserId).uuid().not_null())
                    .col(ColumnDef::new(Files::ContentHash).char_len(64).not_null())
                    .col(ColumnDef::new(Files::SizeBytes).big_integer().not_null())
                    .col(ColumnDef::new(Files::MimeType).string_len(127).not_null())
                    .col(
                        ColumnDef::new(Files::Category)
                            .custom(Alias::new("file_category"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Files::Extension).string_len(16).not_null())
                    .col(ColumnDef::new(Files::StorageKey).string_len(1024).not_null())
                    .col(ColumnDef::new(Files::StorageUrl).text().not_null())
                    .col(ColumnDef::new(Files::CdnUrl).text())
                    .col(ColumnDef::new(Files::StorageRegion).string_len(64))
                    .col(
                        ColumnDef::new(Files::StorageBucket)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Files::StorageProvider)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Files::Width).integer())
                    .col(ColumnDef::new(Files::Height).integer())
                    .col(ColumnDef::new(Files::AspectRatio).string_len(16))
                    .col(ColumnDef::new(Files::DurationSeconds).integer())
                    .col(ColumnDef::new(Files::ThumbnailSmallUrl).text())
                    .col(ColumnDef::new(Files::ThumbnailMediumUrl).text())
                    .col(ColumnDef::new(Files::ThumbnailLargeUrl).text())
                    .col(
                        ColumnDef::new(Files::ProcessingStatus)
                            .custom(Alias::new("processing_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::processing_status")),
                    )
                    .col(ColumnDef::new(Files::ProcessingError).text())
                    .col(
                        ColumnDef::new(Files::ModerationStatus)
                            .string_len(32)
                            .not_null()
                            .default("unreviewed"),
                    )
                    .col(
                        ColumnDef::new(Files::VirusScanStatus)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Files::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Files::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Files::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Files::DeletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Files::PermanentlyDeleteAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Files::Visibility)
                            .custom(Alias::new("file_visibility"))
                            .not_null()
                            .default(Expr::cust("'private'::file_visibility")),
                    )
                    .col(
                        ColumnDef::new(Files::DownloadCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Files::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Files::LastAccessedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // At most one live row per content hash.
        conn.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX idx_files_content_hash_live
            ON files (content_hash)
            WHERE deleted_at IS NULL;
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE INDEX idx_files_owner_active
            ON files (uploader_user_id, created_at DESC)
            WHERE deleted_at IS NULL;
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE INDEX idx_files_processing_status
            ON files (processing_status)
            WHERE deleted_at IS NULL;
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE TRIGGER update_files_updated_at
            BEFORE UPDATE ON files
            FOR EACH ROW
            EXECUTE FUNCTION update_updated_at_column();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP TRIGGER IF EXISTS update_files_updated_at ON files")
            .await?;
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        conn.execute_unprepared("DROP TYPE IF EXISTS file_category").await?;
        conn.execute_unprepared("DROP TYPE IF EXISTS processing_status").await?;
        conn.execute_unprepared("DROP TYPE IF EXISTS file_visibility").await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    UploaderUserId,
    ContentHash,
    SizeBytes,
    MimeType,
    Category,
    Extension,
    StorageKey,
    StorageUrl,
    CdnUrl,
    StorageRegion,
    StorageBucket,
    StorageProvider,
    Width,
    Height,
    AspectRatio,
    DurationSeconds,
    ThumbnailSmallUrl,
    ThumbnailMediumUrl,
    ThumbnailLargeUrl,
    ProcessingStatus,
    ProcessingError,
    ModerationStatus,
    VirusScanStatus,
    UploadedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    PermanentlyDeleteAt,
    Visibility,
    DownloadCount,
    ViewCount,
    LastAccessedAt,
}
