use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// `(album_id, file_id)` membership row. Weak reference to `files`: a file
/// removed independently of album membership is not cascaded here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "album_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i64,

    pub album_id: Uuid,
    pub file_id: Uuid,
    pub display_order: Option<i32>,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Albums,
    Files,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Albums => Entity::belongs_to(super::albums::Entity)
                .from(Column::AlbumId)
                .to(super::albums::Column::Id)
                .into(),
            Self::Files => Entity::belongs_to(super::files::Entity)
                .from(Column::FileId)
                .to(super::files::Column::Id)
                .into(),
        }
    }
}

impl Related<super::albums::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Albums.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
