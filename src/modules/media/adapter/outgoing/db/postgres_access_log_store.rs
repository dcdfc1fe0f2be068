use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use entity::access_log::{ActiveModel, Column, Entity as AccessLogEntity};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::modules::media::application::ports::outgoing::metadata_store::{AccessLogStore, StoreError};
use crate::modules::media::domain::entities::{AccessLogEntry, AccessType};

#[derive(Clone)]
pub struct PostgresAccessLogStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresAccessLogStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessLogStore for PostgresAccessLogStore {
    async fn insert(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
        let active = ActiveModel {
            id: sea_orm::NotSet,
            file_id: Set(entry.file_id),
            user_id: Set(entry.user_id),
            access_type: Set(access_type_str(entry.access_type).to_string()),
            ip: Set(entry.ip.clone()),
            user_agent: Set(entry.user_agent.clone()),
            device: Set(entry.device.clone()),
            success: Set(entry.success),
            bytes: Set(entry.bytes as i64),
            created_at: Set(entry.created_at.into()),
        };
        AccessLogEntity::insert(active).exec(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn recent_for_file(&self, file_id: Uuid, limit: u64) -> Result<Vec<AccessLogEntry>, StoreError> {
        let models = AccessLogEntity::find()
            .filter(Column::FileId.eq(file_id))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(models
            .into_iter()
            .map(|m| AccessLogEntry {
                file_id: m.file_id,
                user_id: m.user_id,
                access_type: access_type_from_str(&m.access_type),
                ip: m.ip,
                user_agent: m.user_agent,
                device: m.device,
                success: m.success,
                bytes: m.bytes as u64,
                created_at: m.created_at.with_timezone(&Utc),
            })
            .collect())
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

fn access_type_str(access_type: AccessType) -> &'static str {
    match access_type {
        AccessType::Upload => "upload",
        AccessType::View => "view",
        AccessType::Download => "download",
    }
}

fn access_type_from_str(value: &str) -> AccessType {
    match value {
        "view" => AccessType::View,
        "download" => AccessType::Download,
        _ => AccessType::Upload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::access_log::Model;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_model(file_id: Uuid, access_type: &str) -> Model {
        Model {
            id: 1,
            file_id,
            user_id: Some(Uuid::new_v4()),
            access_type: access_type.to_string(),
            ip: Some("203.0.113.4".to_string()),
            user_agent: Some("test-agent".to_string()),
            device: None,
            success: true,
            bytes: 2048,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn recent_for_file_maps_access_type() {
        let file_id = Uuid::new_v4();
        let model = test_model(file_id, "download");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let store = PostgresAccessLogStore::new(Arc::new(db));
        let entries = store.recent_for_file(file_id, 10).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_id, file_id);
        assert_eq!(entries[0].access_type, AccessType::Download);
    }
}
