use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// Cached per-user snapshot. Advisory only — quota decisions always use
/// the live aggregate, never this row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "storage_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    pub total_bytes: i64,
    pub total_files: i64,
    pub image_bytes: i64,
    pub image_count: i64,
    pub video_bytes: i64,
    pub video_count: i64,
    pub audio_bytes: i64,
    pub audio_count: i64,
    pub document_bytes: i64,
    pub document_count: i64,
    pub other_bytes: i64,
    pub other_count: i64,

    pub storage_quota_bytes: i64,
    pub storage_used_percentage: f64,
    pub last_calculated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("no relations")
    }
}

impl ActiveModelBehavior for ActiveModel {}
