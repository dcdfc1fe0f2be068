use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use tracing::warn;
use uuid::Uuid;

use crate::modules::media::application::ports::incoming::LifecycleManagerPort;
use crate::modules::media::application::ports::outgoing::blob_store::BlobStore;
use crate::modules::media::application::ports::outgoing::metadata_store::{AccessLogStore, FileStore};
use crate::modules::media::application::services::resilience::ResilienceWrapper;
use crate::modules::media::domain::entities::{AccessLogEntry, AccessType, File, FileCategory, Visibility};
use crate::modules::media::domain::errors::MediaError;
use crate::modules::media::domain::policies::config::MediaServiceConfig;

/// Soft/hard delete and restore.
pub struct LifecycleManager<Fs, B, A>
where
    Fs: FileStore,
    B: BlobStore,
    A: AccessLogStore,
{
    files: Arc<Fs>,
    blobs: Arc<B>,
    access_log: Arc<A>,
    config: Arc<MediaServiceConfig>,
    resilience: Arc<ResilienceWrapper>,
}

impl<Fs, B, A> LifecycleManager<Fs, B, A>
where
    Fs: FileStore,
    B: BlobStore,
    A: AccessLogStore,
{
    pub fn new(
        files: Arc<Fs>,
        blobs: Arc<B>,
        access_log: Arc<A>,
        config: Arc<MediaServiceConfig>,
        resilience: Arc<ResilienceWrapper>,
    ) -> Self {
        Self { files, blobs, access_log, config, resilience }
    }

    fn authorize_owner(file: &File, requester: Uuid) -> Result<(), MediaError> {
        if file.uploader_user_id != requester {
            return Err(MediaError::AccessDenied);
        }
        Ok(())
    }

    fn authorize_read(file: &File, requester: Uuid) -> Result<(), MediaError> {
        if file.visibility == Visibility::Private && file.uploader_user_id != requester {
            return Err(MediaError::AccessDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl<Fs, B, A> LifecycleManagerPort for LifecycleManager<Fs, B, A>
where
    Fs: FileStore,
    B: BlobStore,
    A: AccessLogStore,
{
    async fn get_file(&self, requester: Uuid, file_id: Uuid) -> Result<File, MediaError> {
        let file = self
            .resilience
            .call(|| self.files.find_by_id(file_id))
            .await?
            .filter(|f| !f.is_deleted())
            .ok_or(MediaError::FileNotFound)?;

        Self::authorize_read(&file, requester)?;

        if let Err(e) = self.resilience.call(|| self.files.record_access(file_id, AccessType::View)).await {
            warn!(file_id = %file_id, error = %e, "view count increment failed (best effort)");
        }

        Ok(file)
    }

    async fn download(
        &self,
        requester: Uuid,
        file_id: Uuid,
        ip: Option<String>,
        user_agent: Option<String>,
        device: Option<String>,
    ) -> Result<(File, BoxStream<'static, Result<Bytes, std::io::Error>>), MediaError> {
        let file = self.get_file(requester, file_id).await?;
        let stream = self
            .blobs
            .download(&file.storage_key)
            .await
            .map_err(|e| MediaError::StorageError(e.to_string()))?;

        let entry = AccessLogEntry {
            file_id,
            user_id: Some(requester),
            access_type: AccessType::Download,
            ip,
            user_agent,
            device,
            success: true,
            bytes: file.size_bytes,
            created_at: Utc::now(),
        };
        if let Err(e) = self.resilience.call(|| self.access_log.insert(&entry)).await {
            warn!(file_id = %file_id, error = %e, "access log write failed (best effort)");
        }

        Ok((file, stream))
    }

    async fn list_for_owner(
        &self,
        owner: Uuid,
        category: Option<FileCategory>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<File>, MediaError> {
        self.resilience.call(|| self.files.list_for_owner(owner, category, limit, offset)).await
    }

    async fn soft_delete(&self, requester: Uuid, file_id: Uuid, permanent: bool) -> Result<(), MediaError> {
        let file = self
            .resilience
            .call(|| self.files.find_by_id(file_id))
            .await?
            .ok_or(MediaError::FileNotFound)?;

        Self::authorize_owner(&file, requester)?;

        if permanent {
            return self.hard_delete_file(&file).await;
        }

        if file.is_deleted() {
            // Idempotent: repeated soft-deletes are no-ops.
            return Ok(());
        }

        let now = Utc::now();
        let permanently_delete_at = now + chrono::Duration::from_std(self.config.soft_delete_retention)
            .unwrap_or_else(|_| chrono::Duration::days(30));

        self.resilience
            .call(|| self.files.soft_delete(file_id, now, permanently_delete_at))
            .await
    }

    async fn restore(&self, requester: Uuid, file_id: Uuid) -> Result<(), MediaError> {
        let file = self
            .resilience
            .call(|| self.files.find_by_id(file_id))
            .await?
            .ok_or(MediaError::FileNotFound)?;

        Self::authorize_owner(&file, requester)?;
        self.resilience.call(|| self.files.restore(file_id)).await
    }

    async fn purge_expired(&self, as_of: DateTime<Utc>) -> Result<u64, MediaError> {
        let due = self.resilience.call(|| self.files.find_due_for_purge(as_of)).await?;

        let mut purged = 0u64;
        for file in due {
            if let Err(e) = self.blobs.delete(&file.storage_key).await {
                warn!(file_id = %file.file_id, error = %e, "hard-delete blob removal failed, proceeding with metadata removal");
            }
            if let Err(e) = self.resilience.call(|| self.files.hard_delete(file.file_id)).await {
                warn!(file_id = %file.file_id, error = %e, "hard-delete metadata removal failed");
                continue;
            }
            purged += 1;
        }
        Ok(purged)
    }
}

impl<Fs, B, A> LifecycleManager<Fs, B, A>
where
    Fs: FileStore,
    B: BlobStore,
    A: AccessLogStore,
{
    /// Immediate permanent removal, requested directly by the owner rather
    /// than discovered by the periodic purge job. Same best-effort
    /// blob-then-metadata order as `purge_expired`.
    async fn hard_delete_file(&self, file: &File) -> Result<(), MediaError> {
        if let Err(e) = self.blobs.delete(&file.storage_key).await {
            warn!(file_id = %file.file_id, error = %e, "hard-delete blob removal failed, proceeding with metadata removal");
        }
        self.resilience.call(|| self.files.hard_delete(file.file_id)).await
    }
}
