use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::modules::media::application::ports::incoming::{IngestCommand, IngestPipelinePort};
use crate::modules::media::application::ports::outgoing::blob_store::BlobStore;
use crate::modules::media::application::ports::outgoing::metadata_store::FileStore;
use crate::modules::media::application::ports::outgoing::thumbnail_job_queue::ThumbnailJobQueue;
use crate::modules::media::application::services::content_hasher::ContentHasher;
use crate::modules::media::application::services::quota::QuotaAccountant;
use crate::modules::media::application::services::resilience::ResilienceWrapper;
use crate::modules::media::application::services::storage_key::StorageKeyDeriver;
use crate::modules::media::domain::entities::{
    AccessLogEntry, AccessType, File, FileCategory, ProcessingStatus,
};
use crate::modules::media::domain::errors::MediaError;
use crate::modules::media::domain::policies::config::MediaServiceConfig;
use crate::modules::media::domain::policies::upload_policy::UploadPolicy;

use super::super::ports::outgoing::metadata_store::AccessLogStore;

/// The heart of the media service: size guard, quota guard, hash, dedup
/// probe, blob upload, metadata insert, with a compensating blob delete
/// if metadata insert fails.
pub struct IngestPipeline<Fs, St, B, Q, A>
where
    Fs: FileStore,
    St: crate::modules::media::application::ports::outgoing::metadata_store::StorageStatStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
    A: AccessLogStore,
{
    files: Arc<Fs>,
    blobs: Arc<B>,
    thumbnail_queue: Arc<Q>,
    access_log: Arc<A>,
    quota: Arc<QuotaAccountant<Fs, St>>,
    upload_policy: UploadPolicy,
    config: Arc<MediaServiceConfig>,
    resilience: Arc<ResilienceWrapper>,
}

impl<Fs, St, B, Q, A> IngestPipeline<Fs, St, B, Q, A>
where
    Fs: FileStore,
    St: crate::modules::media::application::ports::outgoing::metadata_store::StorageStatStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
    A: AccessLogStore,
{
    pub fn new(
        files: Arc<Fs>,
        blobs: Arc<B>,
        thumbnail_queue: Arc<Q>,
        access_log: Arc<A>,
        quota: Arc<QuotaAccountant<Fs, St>>,
        upload_policy: UploadPolicy,
        config: Arc<MediaServiceConfig>,
        resilience: Arc<ResilienceWrapper>,
    ) -> Self {
        Self {
            files,
            blobs,
            thumbnail_queue,
            access_log,
            quota,
            upload_policy,
            config,
            resilience,
        }
    }
}

#[async_trait]
impl<Fs, St, B, Q, A> IngestPipelinePort for IngestPipeline<Fs, St, B, Q, A>
where
    Fs: FileStore,
    St: crate::modules::media::application::ports::outgoing::metadata_store::StorageStatStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
    A: AccessLogStore,
{
    async fn ingest(&self, command: IngestCommand) -> Result<File, MediaError> {
        // 1. Size guard.
        self.upload_policy.validate(
            &self.config,
            command.context,
            &command.mime_type,
            command.declared_size_bytes,
        )?;

        // 2. Quota guard (error precedence: size -> quota -> read -> storage -> persistence).
        self.quota
            .check_quota(command.uploader_user_id, command.declared_size_bytes)
            .await?;

        // 3. Hash + buffer.
        let hasher = ContentHasher::new(self.config.max_file_size_bytes);
        let hashed = hasher.hash_stream(command.data).await?;

        // 4. Dedup probe.
        if self.config.dedup_enabled {
            if let Some(existing) = self
                .resilience
                .call(|| self.files.find_live_by_content_hash(&hashed.hex_digest))
                .await?
            {
                self.log_access_best_effort(
                    existing.file_id,
                    command.uploader_user_id,
                    hashed.size_bytes,
                    command.ip.clone(),
                    command.user_agent.clone(),
                    command.device_id.clone(),
                )
                .await;
                return Ok(existing);
            }
        }

        let extension = extension_from_file_name(&command.original_file_name);
        let category = FileCategory::from_mime_type(&command.mime_type);
        let now = Utc::now();

        // 5. Derive storage key.
        let storage_key = StorageKeyDeriver::derive(
            command.context,
            command.uploader_user_id,
            &hashed.hex_digest,
            &extension,
            now,
        );

        // 6. Blob upload.
        let byte_stream: BoxStream<'static, Result<Bytes, std::io::Error>> =
            stream::iter(vec![Ok(hashed.buffered_bytes.clone())]).boxed();
        self.blobs
            .upload(&storage_key, &command.mime_type, byte_stream)
            .await
            .map_err(|e| MediaError::StorageError(e.to_string()))?;

        let storage_url = format!("https://storage.googleapis.com/{}/{}", self.config.upload_bucket, storage_key);
        let cdn_url = if self.config.cdn_enabled {
            Some(format!("{}/{}", self.config.cdn_base_url, storage_key))
        } else {
            None
        };

        let file = File {
            file_id: Uuid::new_v4(),
            content_hash: hashed.hex_digest,
            size_bytes: hashed.size_bytes,
            mime_type: command.mime_type.clone(),
            category,
            extension,
            storage_key: storage_key.clone(),
            storage_url,
            cdn_url,
            storage_region: self.config.storage_region.clone(),
            storage_bucket: self.config.upload_bucket.clone(),
            storage_provider: self.config.storage_provider.clone(),
            width: None,
            height: None,
            aspect_ratio: None,
            duration_seconds: None,
            thumbnail_small_url: None,
            thumbnail_medium_url: None,
            thumbnail_large_url: None,
            processing_status: ProcessingStatus::Pending,
            processing_error: None,
            moderation_status: "pending".to_string(),
            virus_scan_status: "pending".to_string(),
            uploaded_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            permanently_delete_at: None,
            uploader_user_id: command.uploader_user_id,
            visibility: command.visibility,
            download_count: 0,
            view_count: 0,
            last_accessed_at: None,
        };

        // 7. Metadata insert, with compensating delete on failure (8). A
        // dedup-race loser hits the partial unique index on
        // (content_hash) WHERE deleted_at IS NULL and gets back
        // StoreError::Conflict, which the resilience layer maps uniquely to
        // MediaError::PersistenceError: its own blob is the one to discard,
        // and the winner's already-persisted row is the one to return.
        if let Err(e) = self.resilience.call(|| self.files.insert(&file)).await {
            if matches!(e, MediaError::PersistenceError(_)) {
                warn!(storage_key = %storage_key, "lost dedup race, returning winner's row");
                if let Err(delete_err) = self.blobs.delete(&storage_key).await {
                    error!(storage_key = %storage_key, error = %delete_err, "compensating blob delete failed after lost dedup race");
                }
                let winner = self
                    .resilience
                    .call(|| self.files.find_live_by_content_hash(&file.content_hash))
                    .await?
                    .ok_or_else(|| MediaError::DatabaseError("dedup race winner row not found on retry".to_string()))?;
                self.log_access_best_effort(
                    winner.file_id,
                    command.uploader_user_id,
                    winner.size_bytes,
                    command.ip.clone(),
                    command.user_agent.clone(),
                    command.device_id.clone(),
                )
                .await;
                return Ok(winner);
            }

            warn!(storage_key = %storage_key, error = %e, "metadata insert failed, compensating blob delete");
            if let Err(delete_err) = self.blobs.delete(&storage_key).await {
                error!(storage_key = %storage_key, error = %delete_err, "compensating blob delete also failed");
            }
            return Err(e);
        }

        if category == FileCategory::Image {
            if let Err(e) = self.thumbnail_queue.enqueue(file.file_id).await {
                warn!(file_id = %file.file_id, error = %e, "failed to enqueue thumbnail job");
            }
        }

        // 9. Access log, best effort.
        self.log_access_best_effort(
            file.file_id,
            command.uploader_user_id,
            file.size_bytes,
            command.ip.clone(),
            command.user_agent.clone(),
            command.device_id.clone(),
        )
        .await;

        info!(file_id = %file.file_id, "ingest completed");
        Ok(file)
    }
}

impl<Fs, St, B, Q, A> IngestPipeline<Fs, St, B, Q, A>
where
    Fs: FileStore,
    St: crate::modules::media::application::ports::outgoing::metadata_store::StorageStatStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
    A: AccessLogStore,
{
    async fn log_access_best_effort(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        bytes: u64,
        ip: Option<String>,
        user_agent: Option<String>,
        device: Option<String>,
    ) {
        let entry = AccessLogEntry {
            file_id,
            user_id: Some(user_id),
            access_type: AccessType::Upload,
            ip,
            user_agent,
            device,
            success: true,
            bytes,
            created_at: Utc::now(),
        };
        if let Err(e) = self.resilience.call(|| self.access_log.insert(&entry)).await {
            warn!(file_id = %file_id, error = %e, "access log write failed (best effort)");
        }
    }
}

fn extension_from_file_name(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::modules::media::application::ports::outgoing::blob_store::BlobError;
    use crate::modules::media::application::ports::outgoing::metadata_store::{StorageStatStore, StoreError};
    use crate::modules::media::application::ports::outgoing::thumbnail_job_queue::{
        QueueError, ThumbnailFailureReason, ThumbnailJob,
    };
    use crate::modules::media::domain::entities::{StorageStat, UploadContext, Visibility};

    #[derive(Default)]
    struct FakeFileStore {
        files: Mutex<Vec<File>>,
        /// When `true`, the next `insert` reports a conflict instead of
        /// succeeding, simulating a lost dedup race against a concurrent
        /// inserter that already committed the winner's row.
        force_conflict_once: Mutex<bool>,
    }

    #[async_trait]
    impl FileStore for FakeFileStore {
        async fn insert(&self, file: &File) -> Result<(), StoreError> {
            let mut force_conflict = self.force_conflict_once.lock().unwrap();
            if *force_conflict {
                *force_conflict = false;
                return Err(StoreError::Conflict("duplicate content_hash".to_string()));
            }
            self.files.lock().unwrap().push(file.clone());
            Ok(())
        }
        async fn find_by_id(&self, file_id: Uuid) -> Result<Option<File>, StoreError> {
            Ok(self.files.lock().unwrap().iter().find(|f| f.file_id == file_id).cloned())
        }
        async fn find_live_by_content_hash(&self, content_hash: &str) -> Result<Option<File>, StoreError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.content_hash == content_hash && f.deleted_at.is_none())
                .cloned())
        }
        async fn update(&self, file: &File) -> Result<(), StoreError> {
            let mut files = self.files.lock().unwrap();
            if let Some(existing) = files.iter_mut().find(|f| f.file_id == file.file_id) {
                *existing = file.clone();
            }
            Ok(())
        }
        async fn soft_delete(
            &self,
            _file_id: Uuid,
            _deleted_at: chrono::DateTime<Utc>,
            _permanently_delete_at: chrono::DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Ok(())
        }
        async fn restore(&self, _file_id: Uuid) -> Result<(), StoreError> {
            Ok(())
        }
        async fn find_due_for_purge(&self, _as_of: chrono::DateTime<Utc>) -> Result<Vec<File>, StoreError> {
            Ok(vec![])
        }
        async fn hard_delete(&self, _file_id: Uuid) -> Result<(), StoreError> {
            Ok(())
        }
        async fn list_for_owner(
            &self,
            _owner: Uuid,
            _category: Option<FileCategory>,
            _limit: u64,
            _offset: u64,
        ) -> Result<Vec<File>, StoreError> {
            Ok(vec![])
        }
        async fn aggregate_usage_for_owner(&self, _owner: Uuid) -> Result<Vec<(FileCategory, u64, u64)>, StoreError> {
            Ok(vec![])
        }
        async fn record_access(&self, _file_id: Uuid, _access_type: AccessType) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBlobStore {
        deleted_keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for FakeBlobStore {
        async fn upload(
            &self,
            _key: &str,
            _content_type: &str,
            _data: BoxStream<'static, Result<Bytes, std::io::Error>>,
        ) -> Result<(), BlobError> {
            Ok(())
        }
        async fn download(&self, _key: &str) -> Result<BoxStream<'static, Result<Bytes, std::io::Error>>, BlobError> {
            Ok(stream::empty().boxed())
        }
        async fn delete(&self, key: &str) -> Result<(), BlobError> {
            self.deleted_keys.lock().unwrap().push(key.to_string());
            Ok(())
        }
        async fn presigned_url(&self, key: &str, _ttl: std::time::Duration) -> Result<String, BlobError> {
            Ok(key.to_string())
        }
        async fn exists(&self, _key: &str) -> Result<bool, BlobError> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct FakeThumbnailQueue;

    #[async_trait]
    impl ThumbnailJobQueue for FakeThumbnailQueue {
        async fn enqueue(&self, _file_id: Uuid) -> Result<(), QueueError> {
            Ok(())
        }
        async fn claim_batch(&self, _max: u32) -> Result<Vec<ThumbnailJob>, QueueError> {
            Ok(vec![])
        }
        async fn mark_done(&self, _job_id: Uuid) -> Result<(), QueueError> {
            Ok(())
        }
        async fn mark_failed(&self, _job_id: Uuid, _reason: ThumbnailFailureReason) -> Result<(), QueueError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAccessLogStore {
        entries: Mutex<Vec<AccessLogEntry>>,
    }

    #[async_trait]
    impl AccessLogStore for FakeAccessLogStore {
        async fn insert(&self, entry: &AccessLogEntry) -> Result<(), StoreError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
        async fn recent_for_file(&self, _file_id: Uuid, _limit: u64) -> Result<Vec<AccessLogEntry>, StoreError> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct FakeStorageStatStore;

    #[async_trait]
    impl StorageStatStore for FakeStorageStatStore {
        async fn get(&self, _owner: Uuid) -> Result<Option<StorageStat>, StoreError> {
            Ok(None)
        }
        async fn upsert(&self, _stat: &StorageStat) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn test_resilience() -> Arc<ResilienceWrapper> {
        Arc::new(ResilienceWrapper::new(MediaServiceConfig::for_tests()))
    }

    fn byte_stream(data: &'static [u8]) -> BoxStream<'static, Result<Bytes, std::io::Error>> {
        stream::iter(vec![Ok(Bytes::from_static(data))]).boxed()
    }

    fn test_pipeline(
        files: Arc<FakeFileStore>,
        dedup_enabled: bool,
    ) -> IngestPipeline<FakeFileStore, FakeStorageStatStore, FakeBlobStore, FakeThumbnailQueue, FakeAccessLogStore> {
        let mut config = MediaServiceConfig::for_tests();
        config.dedup_enabled = dedup_enabled;
        let config = Arc::new(config);
        let stats = Arc::new(FakeStorageStatStore);
        let quota = Arc::new(QuotaAccountant::new(
            Arc::clone(&files),
            Arc::clone(&stats),
            Arc::clone(&config),
            test_resilience(),
        ));
        IngestPipeline::new(
            files,
            Arc::new(FakeBlobStore::default()),
            Arc::new(FakeThumbnailQueue),
            Arc::new(FakeAccessLogStore::default()),
            quota,
            UploadPolicy::default(),
            config,
            test_resilience(),
        )
    }

    fn upload_command(uploader: Uuid, name: &str) -> IngestCommand {
        IngestCommand {
            uploader_user_id: uploader,
            context: UploadContext::UserUpload,
            original_file_name: name.to_string(),
            mime_type: "image/png".to_string(),
            declared_size_bytes: 11,
            visibility: Visibility::Private,
            device_id: None,
            ip: None,
            user_agent: None,
            data: byte_stream(b"hello world"),
        }
    }

    /// Pre-seeds a winner row with the content hash "hello world" hashes
    /// to, simulating a concurrent inserter that has already committed by
    /// the time this test's own insert runs.
    async fn seed_winner(files: &FakeFileStore, uploader: Uuid) -> File {
        let hashed = ContentHasher::new(1024).hash_stream(byte_stream(b"hello world")).await.unwrap();
        let now = Utc::now();
        let winner = File {
            file_id: Uuid::new_v4(),
            content_hash: hashed.hex_digest,
            size_bytes: hashed.size_bytes,
            mime_type: "image/png".to_string(),
            category: FileCategory::Image,
            extension: ".png".to_string(),
            storage_key: "winner-key".to_string(),
            storage_url: "https://example/winner-key".to_string(),
            cdn_url: None,
            storage_region: None,
            storage_bucket: "test-bucket".to_string(),
            storage_provider: "gcs".to_string(),
            width: None,
            height: None,
            aspect_ratio: None,
            duration_seconds: None,
            thumbnail_small_url: None,
            thumbnail_medium_url: None,
            thumbnail_large_url: None,
            processing_status: ProcessingStatus::Pending,
            processing_error: None,
            moderation_status: "pending".to_string(),
            virus_scan_status: "pending".to_string(),
            uploaded_at: now,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            permanently_delete_at: None,
            uploader_user_id: uploader,
            visibility: Visibility::Private,
            download_count: 0,
            view_count: 0,
            last_accessed_at: None,
        };
        files.files.lock().unwrap().push(winner.clone());
        winner
    }

    #[tokio::test]
    async fn losing_dedup_race_returns_winners_row_without_extra_blob() {
        let files = Arc::new(FakeFileStore::default());
        let uploader = Uuid::new_v4();
        let winner = seed_winner(&files, uploader).await;

        // Dedup disabled so the pipeline actually reaches `insert` instead
        // of short-circuiting on the probe, exercising the conflict branch
        // in isolation.
        let pipeline = test_pipeline(Arc::clone(&files), false);
        *files.force_conflict_once.lock().unwrap() = true;

        let result = pipeline.ingest(upload_command(uploader, "b.png")).await.unwrap();

        assert_eq!(result.file_id, winner.file_id);
        assert_eq!(files.files.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dedup_probe_short_circuits_before_any_insert() {
        let files = Arc::new(FakeFileStore::default());
        let pipeline = test_pipeline(Arc::clone(&files), true);
        let uploader = Uuid::new_v4();

        let first = pipeline.ingest(upload_command(uploader, "a.png")).await.unwrap();
        let second = pipeline.ingest(upload_command(uploader, "b.png")).await.unwrap();

        assert_eq!(first.file_id, second.file_id);
        assert_eq!(files.files.lock().unwrap().len(), 1);
    }
}
