use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::files::{ActiveModel, Column, Entity as FileEntity, Model};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::modules::media::application::ports::outgoing::metadata_store::{FileStore, StoreError};
use crate::modules::media::domain::entities::{
    AccessType, File, FileCategory, ProcessingStatus, UserId, Visibility,
};

/// Typed sea-orm repository over the `files` table: one entity, one
/// domain conversion, no reflective field-tag magic.
#[derive(Clone)]
pub struct PostgresFileStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresFileStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileStore for PostgresFileStore {
    async fn insert(&self, file: &File) -> Result<(), StoreError> {
        let active: ActiveModel = to_active_model(file);
        FileEntity::insert(active)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, file_id: Uuid) -> Result<Option<File>, StoreError> {
        let model = FileEntity::find_by_id(file_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn find_live_by_content_hash(&self, content_hash: &str) -> Result<Option<File>, StoreError> {
        let model = FileEntity::find()
            .filter(Column::ContentHash.eq(content_hash))
            .filter(Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn update(&self, file: &File) -> Result<(), StoreError> {
        let active: ActiveModel = to_active_model(file);
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn soft_delete(
        &self,
        file_id: Uuid,
        deleted_at: DateTime<Utc>,
        permanently_delete_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let existing = FileEntity::find_by_id(file_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .ok_or(StoreError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.deleted_at = Set(Some(deleted_at.into()));
        active.permanently_delete_at = Set(Some(permanently_delete_at.into()));
        active.updated_at = Set(Utc::now().into());
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn restore(&self, file_id: Uuid) -> Result<(), StoreError> {
        let existing = FileEntity::find_by_id(file_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .ok_or(StoreError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.deleted_at = Set(None);
        active.permanently_delete_at = Set(None);
        active.updated_at = Set(Utc::now().into());
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn find_due_for_purge(&self, as_of: DateTime<Utc>) -> Result<Vec<File>, StoreError> {
        let models = FileEntity::find()
            .filter(Column::DeletedAt.is_not_null())
            .filter(Column::PermanentlyDeleteAt.lte(as_of))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn hard_delete(&self, file_id: Uuid) -> Result<(), StoreError> {
        FileEntity::delete_by_id(file_id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        category: Option<FileCategory>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<File>, StoreError> {
        let mut query = FileEntity::find()
            .filter(Column::UploaderUserId.eq(owner))
            .filter(Column::DeletedAt.is_null());

        if let Some(category) = category {
            query = query.filter(Column::Category.eq(to_entity_category(category)));
        }

        let models = query
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn aggregate_usage_for_owner(&self, owner: UserId) -> Result<Vec<(FileCategory, u64, u64)>, StoreError> {
        let models = FileEntity::find()
            .filter(Column::UploaderUserId.eq(owner))
            .filter(Column::DeletedAt.is_null())
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let mut totals: std::collections::HashMap<FileCategory, (u64, u64)> = std::collections::HashMap::new();
        for model in models {
            let category = from_entity_category(model.category);
            let entry = totals.entry(category).or_insert((0, 0));
            entry.0 += model.size_bytes as u64;
            entry.1 += 1;
        }

        Ok(totals.into_iter().map(|(c, (bytes, count))| (c, bytes, count)).collect())
    }

    async fn record_access(&self, file_id: Uuid, access_type: AccessType) -> Result<(), StoreError> {
        let existing = FileEntity::find_by_id(file_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .ok_or(StoreError::NotFound)?;

        let mut active: ActiveModel = existing.clone().into();
        match access_type {
            AccessType::View => active.view_count = Set(existing.view_count + 1),
            AccessType::Download => active.download_count = Set(existing.download_count + 1),
            AccessType::Upload => {}
        }
        active.last_accessed_at = Set(Some(Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }
}

fn map_db_err(err: sea_orm::DbErr) -> StoreError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("duplicate") || lower.contains("unique") {
        StoreError::Conflict(msg)
    } else if lower.contains("timeout") {
        StoreError::Timeout
    } else if lower.contains("connection") {
        StoreError::Unavailable(msg)
    } else {
        StoreError::Database(msg)
    }
}

fn to_entity_category(category: FileCategory) -> entity::files::FileCategory {
    match category {
        FileCategory::Image => entity::files::FileCategory::Image,
        FileCategory::Video => entity::files::FileCategory::Video,
        FileCategory::Audio => entity::files::FileCategory::Audio,
        FileCategory::Document => entity::files::FileCategory::Document,
        FileCategory::Other => entity::files::FileCategory::Other,
    }
}

fn from_entity_category(category: entity::files::FileCategory) -> FileCategory {
    match category {
        entity::files::FileCategory::Image => FileCategory::Image,
        entity::files::FileCategory::Video => FileCategory::Video,
        entity::files::FileCategory::Audio => FileCategory::Audio,
        entity::files::FileCategory::Document => FileCategory::Document,
        entity::files::FileCategory::Other => FileCategory::Other,
    }
}

fn to_entity_status(status: ProcessingStatus) -> entity::files::ProcessingStatus {
    match status {
        ProcessingStatus::Pending => entity::files::ProcessingStatus::Pending,
        ProcessingStatus::Processing => entity::files::ProcessingStatus::Processing,
        ProcessingStatus::Completed => entity::files::ProcessingStatus::Completed,
        ProcessingStatus::Failed => entity::files::ProcessingStatus::Failed,
    }
}

fn from_entity_status(status: entity::files::ProcessingStatus) -> ProcessingStatus {
    match status {
        entity::files::ProcessingStatus::Pending => ProcessingStatus::Pending,
        entity::files::ProcessingStatus::Processing => ProcessingStatus::Processing,
        entity::files::ProcessingStatus::Completed => ProcessingStatus::Completed,
        entity::files::ProcessingStatus::Failed => ProcessingStatus::Failed,
    }
}

fn to_entity_visibility(visibility: Visibility) -> entity::files::Visibility {
    match visibility {
        Visibility::Private => entity::files::Visibility::Private,
        Visibility::Public => entity::files::Visibility::Public,
        Visibility::Unlisted => entity::files::Visibility::Unlisted,
    }
}

fn from_entity_visibility(visibility: entity::files::Visibility) -> Visibility {
    match visibility {
        entity::files::Visibility::Private => Visibility::Private,
        entity::files::Visibility::Public => Visibility::Public,
        entity::files::Visibility::Unlisted => Visibility::Unlisted,
    }
}

fn to_active_model(file: &File) -> ActiveModel {
    ActiveModel {
        id: Set(file.file_id),
        uploader_user_id: Set(file.uploader_user_id),
        content_hash: Set(file.content_hash.clone()),
        size_bytes: Set(file.size_bytes as i64),
        mime_type: Set(file.mime_type.clone()),
        category: Set(to_entity_category(file.category)),
        extension: Set(file.extension.clone()),
        storage_key: Set(file.storage_key.clone()),
        storage_url: Set(file.storage_url.clone()),
        cdn_url: Set(file.cdn_url.clone()),
        storage_region: Set(file.storage_region.clone()),
        storage_bucket: Set(file.storage_bucket.clone()),
        storage_provider: Set(file.storage_provider.clone()),
        width: Set(file.width.map(|w| w as i32)),
        height: Set(file.height.map(|h| h as i32)),
        aspect_ratio: Set(file.aspect_ratio.clone()),
        duration_seconds: Set(file.duration_seconds.map(|d| d as i32)),
        thumbnail_small_url: Set(file.thumbnail_small_url.clone()),
        thumbnail_medium_url: Set(file.thumbnail_medium_url.clone()),
        thumbnail_large_url: Set(file.thumbnail_large_url.clone()),
        processing_status: Set(to_entity_status(file.processing_status)),
        processing_error: Set(file.processing_error.clone()),
        moderation_status: Set(file.moderation_status.clone()),
        virus_scan_status: Set(file.virus_scan_status.clone()),
        uploaded_at: Set(file.uploaded_at.into()),
        created_at: Set(file.created_at.into()),
        updated_at: Set(file.updated_at.into()),
        deleted_at: Set(file.deleted_at.map(Into::into)),
        permanently_delete_at: Set(file.permanently_delete_at.map(Into::into)),
        visibility: Set(to_entity_visibility(file.visibility)),
        download_count: Set(file.download_count as i64),
        view_count: Set(file.view_count as i64),
        last_accessed_at: Set(file.last_accessed_at.map(Into::into)),
    }
}

fn to_domain(model: Model) -> File {
    File {
        file_id: model.id,
        content_hash: model.content_hash,
        size_bytes: model.size_bytes as u64,
        mime_type: model.mime_type,
        category: from_entity_category(model.category),
        extension: model.extension,
        storage_key: model.storage_key,
        storage_url: model.storage_url,
        cdn_url: model.cdn_url,
        storage_region: model.storage_region,
        storage_bucket: model.storage_bucket,
        storage_provider: model.storage_provider,
        width: model.width.map(|w| w as u32),
        height: model.height.map(|h| h as u32),
        aspect_ratio: model.aspect_ratio,
        duration_seconds: model.duration_seconds.map(|d| d as u32),
        thumbnail_small_url: model.thumbnail_small_url,
        thumbnail_medium_url: model.thumbnail_medium_url,
        thumbnail_large_url: model.thumbnail_large_url,
        processing_status: from_entity_status(model.processing_status),
        processing_error: model.processing_error,
        moderation_status: model.moderation_status,
        virus_scan_status: model.virus_scan_status,
        uploaded_at: model.uploaded_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        deleted_at: model.deleted_at.map(|d| d.with_timezone(&Utc)),
        permanently_delete_at: model.permanently_delete_at.map(|d| d.with_timezone(&Utc)),
        uploader_user_id: model.uploader_user_id,
        visibility: from_entity_visibility(model.visibility),
        download_count: model.download_count as u64,
        view_count: model.view_count as u64,
        last_accessed_at: model.last_accessed_at.map(|d| d.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_model(id: Uuid) -> Model {
        let now = Utc::now().into();
        Model {
            id,
            uploader_user_id: Uuid::new_v4(),
            content_hash: "a".repeat(64),
            size_bytes: 1024,
            mime_type: "image/png".to_string(),
            category: entity::files::FileCategory::Image,
            extension: "png".to_string(),
            storage_key: "user_upload/u/2026/01/01/hash.png".to_string(),
            storage_url: "https://storage.googleapis.com/bucket/key".to_string(),
            cdn_url: None,
            storage_region: None,
            storage_bucket: "bucket".to_string(),
            storage_provider: "gcs".to_string(),
            width: Some(800),
            height: Some(600),
            aspect_ratio: Some("1.33:1".to_string()),
            duration_seconds: None,
            thumbnail_small_url: None,
            thumbnail_medium_url: None,
            thumbnail_large_url: None,
            processing_status: entity::files::ProcessingStatus::Completed,
            processing_error: None,
            moderation_status: "approved".to_string(),
            virus_scan_status: "clean".to_string(),
            uploaded_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            permanently_delete_at: None,
            visibility: entity::files::Visibility::Private,
            download_count: 0,
            view_count: 0,
            last_accessed_at: None,
        }
    }

    #[tokio::test]
    async fn find_by_id_returns_domain_file() {
        let id = Uuid::new_v4();
        let model = test_model(id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let store = PostgresFileStore::new(Arc::new(db));
        let file = store.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(file.file_id, id);
        assert_eq!(file.content_hash, model.content_hash);
        assert_eq!(file.category, FileCategory::Image);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let store = PostgresFileStore::new(Arc::new(db));
        let file = store.find_by_id(Uuid::new_v4()).await.unwrap();

        assert!(file.is_none());
    }

    #[tokio::test]
    async fn insert_maps_duplicate_hash_to_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors(vec![sea_orm::DbErr::Custom(
                "duplicate key value violates unique constraint".to_string(),
            )])
            .into_connection();

        let store = PostgresFileStore::new(Arc::new(db));
        let file = to_domain(test_model(Uuid::new_v4()));

        let err = store.insert(&file).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn hard_delete_succeeds_on_affected_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .into_connection();

        let store = PostgresFileStore::new(Arc::new(db));
        store.hard_delete(Uuid::new_v4()).await.unwrap();
    }
}
