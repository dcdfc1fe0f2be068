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
                IF NOT EXISTS (SELECT 1 FROM pg_type WHERE typname = 'processing_job_status') THEN
                    CREATE TYPE processing_job_status AS ENUM ('queued', 'claimed', 'done', 'failed');
                END IF;
            END$$;
            "#,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProcessingQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcessingQueue::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(ColumnDef::new(ProcessingQueue::FileId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProcessingQueue::Status)
                            .custom(Alias::new("processing_job_status"))
                            .not_null()
                            .default(Expr::cust("'queued'::processing_job_status")),
                    )
                    .col(
                        ColumnDef::new(ProcessingQueue::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ProcessingQueue::LastError).text())
                    .col(ColumnDef::new(ProcessingQueue::ClaimedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ProcessingQueue::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProcessingQueue::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_processing_queue_file")
                            .from(ProcessingQueue::Table, ProcessingQueue::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute_unprepared(
            r#"
            CREATE INDEX idx_processing_queue_claimable
            ON processing_queue (status, created_at)
            WHERE status = 'queued';
            "#,
        )
        .await?;

        conn.execute_unprepared(
            r#"
            CREATE TRIGGER update_processing_queue_updated_at
            BEFORE UPDATE ON processing_queue
            FOR EACH ROW
            EXECUTE FUNCTION update_updated_at_column();
            "#,
        )
        .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProcessingQueue::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS processing_job_status")
            .await
    }
}

#[derive(DeriveIden)]
enum ProcessingQueue {
    Table,
    Id,
    FileId,
    Status,
    Attempts,
    LastError,
    ClaimedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
}
