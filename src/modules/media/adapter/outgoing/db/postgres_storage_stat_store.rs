use std::sync::Arc;

use async_trait::async_trait;
use entity::storage_stats::{ActiveModel, Entity as StorageStatEntity, Model};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::modules::media::application::ports::outgoing::metadata_store::{StorageStatStore, StoreError};
use crate::modules::media::domain::entities::{CategoryUsage, StorageStat, UserId};

#[derive(Clone)]
pub struct PostgresStorageStatStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresStorageStatStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageStatStore for PostgresStorageStatStore {
    async fn get(&self, owner: UserId) -> Result<Option<StorageStat>, StoreError> {
        let model = StorageStatEntity::find_by_id(owner)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn upsert(&self, stat: &StorageStat) -> Result<(), StoreError> {
        let existing = StorageStatEntity::find_by_id(stat.user_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        let active = to_active_model(stat);
        match existing {
            Some(_) => {
                active.update(self.db.as_ref()).await.map_err(map_db_err)?;
            }
            None => {
                StorageStatEntity::insert(active)
                    .exec(self.db.as_ref())
                    .await
                    .map_err(map_db_err)?;
            }
        }
        Ok(())
    }
}

fn map_db_err(err: sea_orm::DbErr) -> StoreError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("timeout") {
        StoreError::Timeout
    } else if lower.contains("connection") {
        StoreError::Unavailable(msg)
    } else {
        StoreError::Database(msg)
    }
}

fn to_active_model(stat: &StorageStat) -> ActiveModel {
    ActiveModel {
        user_id: Set(stat.user_id),
        total_bytes: Set(stat.total_bytes as i64),
        total_files: Set(stat.total_files as i64),
        image_bytes: Set(stat.image.bytes as i64),
        image_count: Set(stat.image.count as i64),
        video_bytes: Set(stat.video.bytes as i64),
        video_count: Set(stat.video.count as i64),
        audio_bytes: Set(stat.audio.bytes as i64),
        audio_count: Set(stat.audio.count as i64),
        document_bytes: Set(stat.document.bytes as i64),
        document_count: Set(stat.document.count as i64),
        other_bytes: Set(stat.other.bytes as i64),
        other_count: Set(stat.other.count as i64),
        storage_quota_bytes: Set(stat.storage_quota_bytes as i64),
        storage_used_percentage: Set(stat.storage_used_percentage),
        last_calculated_at: Set(stat.last_calculated_at.into()),
    }
}

fn to_domain(model: Model) -> StorageStat {
    StorageStat {
        user_id: model.user_id,
        total_bytes: model.total_bytes as u64,
        total_files: model.total_files as u64,
        image: CategoryUsage { bytes: model.image_bytes as u64, count: model.image_count as u64 },
        video: CategoryUsage { bytes: model.video_bytes as u64, count: model.video_count as u64 },
        audio: CategoryUsage { bytes: model.audio_bytes as u64, count: model.audio_count as u64 },
        document: CategoryUsage { bytes: model.document_bytes as u64, count: model.document_count as u64 },
        other: CategoryUsage { bytes: model.other_bytes as u64, count: model.other_count as u64 },
        storage_quota_bytes: model.storage_quota_bytes as u64,
        storage_used_percentage: model.storage_used_percentage,
        last_calculated_at: model.last_calculated_at.with_timezone(&chrono::Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn test_model(owner: Uuid) -> Model {
        Model {
            user_id: owner,
            total_bytes: 1024,
            total_files: 1,
            image_bytes: 1024,
            image_count: 1,
            video_bytes: 0,
            video_count: 0,
            audio_bytes: 0,
            audio_count: 0,
            document_bytes: 0,
            document_count: 0,
            other_bytes: 0,
            other_count: 0,
            storage_quota_bytes: 10_737_418_240,
            storage_used_percentage: 0.0001,
            last_calculated_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn get_returns_none_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let store = PostgresStorageStatStore::new(Arc::new(db));
        let stat = store.get(Uuid::new_v4()).await.unwrap();

        assert!(stat.is_none());
    }

    #[tokio::test]
    async fn upsert_inserts_when_no_existing_row() {
        let owner = Uuid::new_v4();
        let stat = to_domain(test_model(owner));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .into_connection();

        let store = PostgresStorageStatStore::new(Arc::new(db));
        store.upsert(&stat).await.unwrap();
    }
}
