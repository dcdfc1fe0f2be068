use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::modules::media::domain::entities::{
    AccessLogEntry, AccessType, Album, AlbumFile, File, FileCategory, Share, StorageStat, UserId,
};

/// Persistence-layer failures, kept separate from `MediaError` so services
/// decide how to translate them into `PersistenceError` / `DatabaseError` /
/// `Timeout`. Each outgoing port gets its own error enum rather than sharing
/// one across the boundary.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("operation timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable(_))
    }
}

/// Outgoing port for the `files` table.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert(&self, file: &File) -> Result<(), StoreError>;

    async fn find_by_id(&self, file_id: Uuid) -> Result<Option<File>, StoreError>;

    /// Looks up a live (non-deleted) file by its content hash, the read
    /// side of the dedup race closure.
    async fn find_live_by_content_hash(&self, content_hash: &str) -> Result<Option<File>, StoreError>;

    async fn update(&self, file: &File) -> Result<(), StoreError>;

    async fn soft_delete(&self, file_id: Uuid, deleted_at: DateTime<Utc>, permanently_delete_at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn restore(&self, file_id: Uuid) -> Result<(), StoreError>;

    /// Files whose soft-delete grace period has elapsed.
    async fn find_due_for_purge(&self, as_of: DateTime<Utc>) -> Result<Vec<File>, StoreError>;

    async fn hard_delete(&self, file_id: Uuid) -> Result<(), StoreError>;

    async fn list_for_owner(
        &self,
        owner: UserId,
        category: Option<FileCategory>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<File>, StoreError>;

    /// Live aggregate used as the authority behind cached storage stats.
    async fn aggregate_usage_for_owner(&self, owner: UserId) -> Result<Vec<(FileCategory, u64, u64)>, StoreError>;

    async fn record_access(&self, file_id: Uuid, access_type: AccessType) -> Result<(), StoreError>;
}

/// Outgoing port for `albums` + `album_files`.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn insert(&self, album: &Album) -> Result<(), StoreError>;
    async fn find_by_id(&self, album_id: Uuid) -> Result<Option<Album>, StoreError>;
    async fn update(&self, album: &Album) -> Result<(), StoreError>;
    async fn delete(&self, album_id: Uuid) -> Result<(), StoreError>;
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Album>, StoreError>;

    async fn add_file(&self, album_file: &AlbumFile) -> Result<(), StoreError>;
    async fn remove_file(&self, album_id: Uuid, file_id: Uuid) -> Result<(), StoreError>;
    async fn list_files(&self, album_id: Uuid) -> Result<Vec<AlbumFile>, StoreError>;
    async fn file_count(&self, album_id: Uuid) -> Result<u32, StoreError>;
}

/// Outgoing port for `shares`.
#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn insert(&self, share: &Share) -> Result<(), StoreError>;
    async fn find_by_id(&self, share_id: Uuid) -> Result<Option<Share>, StoreError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Share>, StoreError>;
    async fn update(&self, share: &Share) -> Result<(), StoreError>;
    async fn revoke(&self, share_id: Uuid, revoked_at: DateTime<Utc>) -> Result<(), StoreError>;
    async fn list_for_file(&self, file_id: Uuid) -> Result<Vec<Share>, StoreError>;

    /// Atomically increments `view_count` iff `max_views` isn't already hit
    /// (`max_views IS NULL OR view_count < max_views`), in one conditional
    /// UPDATE rather than a read-then-write. Returns whether the increment
    /// was applied; `false` means the cap was already reached.
    async fn increment_view_count(&self, share_id: Uuid) -> Result<bool, StoreError>;

    /// Increments `download_count` unconditionally — there is no
    /// `max_downloads` cap in the domain model. Returns `false` only if the
    /// share row no longer exists (e.g. revoked/removed concurrently).
    async fn increment_download_count(&self, share_id: Uuid) -> Result<bool, StoreError>;
}

/// Outgoing port for `access_log`.
#[async_trait]
pub trait AccessLogStore: Send + Sync {
    async fn insert(&self, entry: &AccessLogEntry) -> Result<(), StoreError>;

    /// Recent access history for a file, used to power abuse/rate-limiting
    /// decisions made by a collaborator outside this service.
    async fn recent_for_file(&self, file_id: Uuid, limit: u64) -> Result<Vec<AccessLogEntry>, StoreError>;
}

/// Outgoing port for the cached `storage_stats` snapshot.
#[async_trait]
pub trait StorageStatStore: Send + Sync {
    async fn get(&self, owner: UserId) -> Result<Option<StorageStat>, StoreError>;
    async fn upsert(&self, stat: &StorageStat) -> Result<(), StoreError>;
}
