use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        manager
            .create_table(
                Table::create()
                    .table(Albums::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Albums::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(Albums::UserId).uuid().not_null())
                    .col(ColumnDef::new(Albums::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Albums::Description).text())
                    .col(ColumnDef::new(Albums::CoverFileId).uuid())
                    .col(
                        ColumnDef::new(Albums::AlbumType)
                            .string_len(32)
                            .not_null()
                            .default("standard"),
                    )
                    .col(
                        ColumnDef::new(Albums::Visibility)
                            .custom(Alias::new("file_visibility"))
                            .not_null()
                            .default(Expr::cust("'private'::file_visibility")),
                    )
                    .col(
                        ColumnDef::new(Albums::FileCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Albums::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Albums::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Albums::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_albums_cover_file")
                            .from(Albums::Table, Albums::CoverFileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute_unprepared(
            r#"
            CREATE INDEX idx_albums_owner
            ON albums (user_id, created_at DESC);
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE TRIGGER update_albums_updated_at
            BEFORE UPDATE ON albums
            FOR EACH ROW
            EXECUTE FUNCTION update_updated_at_column();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS update_albums_updated_at ON albums")
            .await?;
        manager
            .drop_table(Table::drop().table(Albums::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Albums {
    Table,
    Id,
    UserId,
    Title,
    Description,
    CoverFileId,
    AlbumType,
    Visibility,
    FileCount,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
}
