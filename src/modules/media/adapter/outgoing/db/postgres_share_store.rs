use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::shares::{ActiveModel, Column, Entity as ShareEntity, Model};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, Statement,
};
use uuid::Uuid;

use crate::modules::media::application::ports::outgoing::metadata_store::{ShareStore, StoreError};
use crate::modules::media::domain::entities::{Share, ShareAccessType};

#[derive(Clone)]
pub struct PostgresShareStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresShareStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShareStore for PostgresShareStore {
    async fn insert(&self, share: &Share) -> Result<(), StoreError> {
        let active = to_active_model(share);
        ShareEntity::insert(active).exec(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, share_id: Uuid) -> Result<Option<Share>, StoreError> {
        let model = ShareEntity::find_by_id(share_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>, StoreError> {
        let model = ShareEntity::find()
            .filter(Column::ShareToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn update(&self, share: &Share) -> Result<(), StoreError> {
        let active = to_active_model(share);
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn revoke(&self, share_id: Uuid, revoked_at: DateTime<Utc>) -> Result<(), StoreError> {
        let existing = ShareEntity::find_by_id(share_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?
            .ok_or(StoreError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.revoked_at = Set(Some(revoked_at.into()));
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn list_for_file(&self, file_id: Uuid) -> Result<Vec<Share>, StoreError> {
        let models = ShareEntity::find()
            .filter(Column::FileId.eq(file_id))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn increment_view_count(&self, share_id: Uuid) -> Result<bool, StoreError> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"UPDATE shares SET view_count = view_count + 1
               WHERE id = $1 AND (max_views IS NULL OR view_count < max_views)"#,
            [share_id.into()],
        );
        let result = self.db.execute(stmt).await.map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_download_count(&self, share_id: Uuid) -> Result<bool, StoreError> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"UPDATE shares SET download_count = download_count + 1 WHERE id = $1"#,
            [share_id.into()],
        );
        let result = self.db.execute(stmt).await.map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
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

fn to_entity_access_type(access_type: ShareAccessType) -> entity::shares::AccessType {
    match access_type {
        ShareAccessType::View => entity::shares::AccessType::View,
        ShareAccessType::Download => entity::shares::AccessType::Download,
        ShareAccessType::Edit => entity::shares::AccessType::Edit,
    }
}

fn from_entity_access_type(access_type: entity::shares::AccessType) -> ShareAccessType {
    match access_type {
        entity::shares::AccessType::View => ShareAccessType::View,
        entity::shares::AccessType::Download => ShareAccessType::Download,
        entity::shares::AccessType::Edit => ShareAccessType::Edit,
    }
}

fn to_active_model(share: &Share) -> ActiveModel {
    ActiveModel {
        id: Set(share.share_id),
        file_id: Set(share.file_id),
        shared_by_user_id: Set(share.shared_by_user_id),
        shared_with_user_id: Set(share.shared_with_user_id),
        shared_with_conversation_id: Set(share.shared_with_conversation_id),
        share_token: Set(share.share_token.clone()),
        access_type: Set(to_entity_access_type(share.access_type)),
        password_hash: Set(share.password_hash.clone()),
        expires_at: Set(share.expires_at.map(Into::into)),
        max_views: Set(share.max_views.map(|v| v as i32)),
        view_count: Set(share.view_count as i32),
        download_count: Set(share.download_count as i32),
        is_active: Set(share.is_active),
        created_at: Set(share.created_at.into()),
        revoked_at: Set(share.revoked_at.map(Into::into)),
    }
}

fn to_domain(model: Model) -> Share {
    Share {
        share_id: model.id,
        file_id: model.file_id,
        shared_by_user_id: model.shared_by_user_id,
        shared_with_user_id: model.shared_with_user_id,
        shared_with_conversation_id: model.shared_with_conversation_id,
        share_token: model.share_token,
        access_type: from_entity_access_type(model.access_type),
        password_hash: model.password_hash,
        expires_at: model.expires_at.map(|d| d.with_timezone(&Utc)),
        max_views: model.max_views.map(|v| v as u32),
        view_count: model.view_count as u32,
        download_count: model.download_count as u32,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        revoked_at: model.revoked_at.map(|d| d.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_model(id: Uuid, token: &str) -> Model {
        let now = Utc::now().into();
        Model {
            id,
            file_id: Uuid::new_v4(),
            shared_by_user_id: Uuid::new_v4(),
            shared_with_user_id: None,
            shared_with_conversation_id: None,
            share_token: token.to_string(),
            access_type: entity::shares::AccessType::View,
            password_hash: None,
            expires_at: None,
            max_views: None,
            view_count: 0,
            download_count: 0,
            is_active: true,
            created_at: now,
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn find_by_token_returns_matching_share() {
        let id = Uuid::new_v4();
        let model = test_model(id, "tok_abc123");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let store = PostgresShareStore::new(Arc::new(db));
        let share = store.find_by_token("tok_abc123").await.unwrap().unwrap();

        assert_eq!(share.share_id, id);
        assert_eq!(share.share_token, "tok_abc123");
        assert!(share.is_active);
    }

    #[tokio::test]
    async fn revoke_marks_share_inactive() {
        let id = Uuid::new_v4();
        let model = test_model(id, "tok_xyz");
        let mut revoked = model.clone();
        revoked.is_active = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .append_query_results(vec![vec![revoked]])
            .into_connection();

        let store = PostgresShareStore::new(Arc::new(db));
        store.revoke(id, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn increment_view_count_reports_success_when_row_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .into_connection();

        let store = PostgresShareStore::new(Arc::new(db));
        let incremented = store.increment_view_count(Uuid::new_v4()).await.unwrap();

        assert!(incremented);
    }

    #[tokio::test]
    async fn increment_view_count_reports_failure_when_cap_already_hit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 0 }])
            .into_connection();

        let store = PostgresShareStore::new(Arc::new(db));
        let incremented = store.increment_view_count(Uuid::new_v4()).await.unwrap();

        assert!(!incremented);
    }
}
