use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier. Authentication is an external collaborator's
/// job — callers already know who they are by the time they reach this
/// module.
pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl FileCategory {
    /// Derives a category from a MIME type's top-level type, the way
    /// upload pipelines classify incoming content.
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type.split('/').next().unwrap_or("") {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ if mime_type == "application/pdf"
                || mime_type.starts_with("application/msword")
                || mime_type.starts_with("application/vnd.") =>
            {
                Self::Document
            }
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    Public,
    Unlisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareAccessType {
    View,
    Download,
    Edit,
}

/// The canonical file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub file_id: Uuid,
    pub content_hash: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub category: FileCategory,
    pub extension: String,

    pub storage_key: String,
    pub storage_url: String,
    pub cdn_url: Option<String>,
    pub storage_region: Option<String>,
    pub storage_bucket: String,
    pub storage_provider: String,

    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub duration_seconds: Option<u32>,
    pub thumbnail_small_url: Option<String>,
    pub thumbnail_medium_url: Option<String>,
    pub thumbnail_large_url: Option<String>,

    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub moderation_status: String,
    pub virus_scan_status: String,

    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub permanently_delete_at: Option<DateTime<Utc>>,

    pub uploader_user_id: UserId,
    pub visibility: Visibility,
    pub download_count: u64,
    pub view_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl File {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub album_id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub cover_file_id: Option<Uuid>,
    pub album_type: String,
    pub visibility: Visibility,
    pub file_count: u32,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumFile {
    pub album_id: Uuid,
    pub file_id: Uuid,
    pub display_order: Option<i32>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub share_id: Uuid,
    pub file_id: Uuid,
    pub shared_by_user_id: UserId,
    pub shared_with_user_id: Option<UserId>,
    pub shared_with_conversation_id: Option<Uuid>,
    pub share_token: String,
    pub access_type: ShareAccessType,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<u32>,
    pub view_count: u32,
    pub download_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Share {
    /// Whether this share can still be used: active, unexpired, under its
    /// view cap.
    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.expires_at.map(|exp| now < exp).unwrap_or(true)
            && self
                .max_views
                .map(|max| self.view_count < max)
                .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoryUsage {
    pub bytes: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStat {
    pub user_id: UserId,
    pub total_bytes: u64,
    pub total_files: u64,
    pub image: CategoryUsage,
    pub video: CategoryUsage,
    pub audio: CategoryUsage,
    pub document: CategoryUsage,
    pub other: CategoryUsage,
    pub storage_quota_bytes: u64,
    pub storage_used_percentage: f64,
    pub last_calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Upload,
    View,
    Download,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub file_id: Uuid,
    pub user_id: Option<UserId>,
    pub access_type: AccessType,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub device: Option<String>,
    pub success: bool,
    pub bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Upload contexts drive the storage-key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadContext {
    UserUpload,
    ProfilePhoto,
    MessageMedia,
}

impl UploadContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserUpload => "uploads",
            Self::ProfilePhoto => "profile_photo",
            Self::MessageMedia => "message_media",
        }
    }
}
