use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AlbumFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AlbumFiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AlbumFiles::AlbumId).uuid().not_null())
                    .col(ColumnDef::new(AlbumFiles::FileId).uuid().not_null())
                    .col(ColumnDef::new(AlbumFiles::DisplayOrder).integer())
                    .col(
                        ColumnDef::new(AlbumFiles::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_files_album")
                            .from(AlbumFiles::Table, AlbumFiles::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_album_files_file")
                            .from(AlbumFiles::Table, AlbumFiles::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique per (album_id, file_id) — §5 shared-resource policy.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX idx_album_files_unique_pair
                ON album_files (album_id, file_id);
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX idx_album_files_order
                ON album_files (album_id, display_order, added_at DESC);
                "#,
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AlbumFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AlbumFiles {
    Table,
    Id,
    AlbumId,
    FileId,
    DisplayOrder,
    AddedAt,
}

#[derive(DeriveIden)]
enum Albums {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
}
