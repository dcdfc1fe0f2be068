//! `files` table: the single source of truth for uploaded blobs, covering
//! content-hash dedup, lifecycle timestamps, derived-media fields, and
//! access counters.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub uploader_user_id: Uuid,

    pub content_hash: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub category: FileCategory,
    pub extension: String,

    pub storage_key: String,
    pub storage_url: String,
    pub cdn_url: Option<String>,
    pub storage_region: Option<String>,
    pub storage_bucket: String,
    pub storage_provider: String,

    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<String>,
    pub duration_seconds: Option<i32>,
    pub thumbnail_small_url: Option<String>,
    pub thumbnail_medium_url: Option<String>,
    pub thumbnail_large_url: Option<String>,

    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub moderation_status: String,
    pub virus_scan_status: String,

    pub uploaded_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub permanently_delete_at: Option<DateTimeWithTimeZone>,

    pub visibility: Visibility,
    pub download_count: i64,
    pub view_count: i64,
    pub last_accessed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "file_category")]
pub enum FileCategory {
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "audio")]
    Audio,
    #[sea_orm(string_value = "document")]
    Document,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "processing_status")]
pub enum ProcessingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "file_visibility")]
pub enum Visibility {
    #[sea_orm(string_value = "private")]
    Private,
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "unlisted")]
    Unlisted,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    AlbumFiles,
    Shares,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::AlbumFiles => Entity::has_many(super::album_files::Entity).into(),
            Self::Shares => Entity::has_many(super::shares::Entity).into(),
        }
    }
}

impl Related<super::album_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumFiles.def()
    }
}

impl Related<super::shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
