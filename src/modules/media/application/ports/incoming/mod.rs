use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::modules::media::domain::entities::{
    Album, AlbumFile, File, FileCategory, Share, ShareAccessType, StorageStat, UploadContext,
    UserId, Visibility,
};
use crate::modules::media::domain::errors::MediaError;

pub struct IngestCommand {
    pub uploader_user_id: UserId,
    pub context: UploadContext,
    pub original_file_name: String,
    pub mime_type: String,
    pub declared_size_bytes: u64,
    pub visibility: Visibility,
    pub device_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub data: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

/// Incoming port grouping the whole upload use case as one trait per
/// pipeline rather than one per operation.
#[async_trait]
pub trait IngestPipelinePort: Send + Sync {
    async fn ingest(&self, command: IngestCommand) -> Result<File, MediaError>;
}

/// Incoming port for the asynchronous thumbnail worker.
#[async_trait]
pub trait ThumbnailPipelinePort: Send + Sync {
    async fn process_one(&self, file_id: Uuid) -> Result<(), MediaError>;

    /// Drains up to `max` queued jobs; returns how many succeeded.
    async fn run_batch(&self, max: u32) -> Result<u32, MediaError>;
}

#[async_trait]
pub trait LifecycleManagerPort: Send + Sync {
    async fn get_file(&self, requester: UserId, file_id: Uuid) -> Result<File, MediaError>;
    async fn download(
        &self,
        requester: UserId,
        file_id: Uuid,
        ip: Option<String>,
        user_agent: Option<String>,
        device: Option<String>,
    ) -> Result<(File, BoxStream<'static, Result<Bytes, std::io::Error>>), MediaError>;
    async fn list_for_owner(
        &self,
        owner: UserId,
        category: Option<FileCategory>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<File>, MediaError>;
    /// `permanent = true` bypasses the soft-delete grace period and removes
    /// the file (and its blob) immediately.
    async fn soft_delete(&self, requester: UserId, file_id: Uuid, permanent: bool) -> Result<(), MediaError>;
    async fn restore(&self, requester: UserId, file_id: Uuid) -> Result<(), MediaError>;
    /// Permanently removes every file whose retention window has elapsed.
    /// Meant to be driven by a periodic job.
    async fn purge_expired(&self, as_of: DateTime<Utc>) -> Result<u64, MediaError>;
}

pub struct CreateShareCommand {
    pub requester: UserId,
    pub file_id: Uuid,
    pub access_type: ShareAccessType,
    pub shared_with_user_id: Option<UserId>,
    pub shared_with_conversation_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<u32>,
    pub password: Option<String>,
}

#[async_trait]
pub trait ShareManagerPort: Send + Sync {
    async fn create_share(&self, command: CreateShareCommand) -> Result<Share, MediaError>;
    async fn resolve_share(&self, token: &str, password: Option<&str>) -> Result<(File, Share), MediaError>;
    async fn record_share_view(&self, share_id: Uuid) -> Result<(), MediaError>;
    async fn record_share_download(&self, share_id: Uuid) -> Result<(), MediaError>;
    async fn revoke(&self, requester: UserId, share_id: Uuid) -> Result<(), MediaError>;
    async fn list_for_file(&self, requester: UserId, file_id: Uuid) -> Result<Vec<Share>, MediaError>;
}

pub struct CreateAlbumCommand {
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub album_type: String,
    pub visibility: Visibility,
}

#[async_trait]
pub trait AlbumManagerPort: Send + Sync {
    async fn create(&self, command: CreateAlbumCommand) -> Result<Album, MediaError>;
    async fn get(&self, requester: UserId, album_id: Uuid) -> Result<Album, MediaError>;
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Album>, MediaError>;
    async fn rename(
        &self,
        requester: UserId,
        album_id: Uuid,
        title: String,
        description: Option<String>,
    ) -> Result<Album, MediaError>;
    async fn delete(&self, requester: UserId, album_id: Uuid) -> Result<(), MediaError>;
    async fn add_file(&self, requester: UserId, album_id: Uuid, file_id: Uuid) -> Result<AlbumFile, MediaError>;
    async fn remove_file(&self, requester: UserId, album_id: Uuid, file_id: Uuid) -> Result<(), MediaError>;
    async fn list_files(&self, requester: UserId, album_id: Uuid) -> Result<Vec<AlbumFile>, MediaError>;
}

#[async_trait]
pub trait QuotaAccountantPort: Send + Sync {
    async fn get_stats(&self, owner: UserId) -> Result<StorageStat, MediaError>;
    async fn check_quota(&self, owner: UserId, additional_bytes: u64) -> Result<(), MediaError>;
    async fn invalidate(&self, owner: UserId) -> Result<(), MediaError>;
}
