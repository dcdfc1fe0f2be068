use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "albums")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cover_file_id: Option<Uuid>,
    pub album_type: String,
    pub visibility: super::files::Visibility,
    pub file_count: i32,
    pub sort_order: i32,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    AlbumFiles,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::AlbumFiles => Entity::has_many(super::album_files::Entity).into(),
        }
    }
}

impl Related<super::album_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
