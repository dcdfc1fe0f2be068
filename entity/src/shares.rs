use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub file_id: Uuid,
    pub shared_by_user_id: Uuid,
    pub shared_with_user_id: Option<Uuid>,
    pub shared_with_conversation_id: Option<Uuid>,

    #[sea_orm(unique)]
    pub share_token: String,
    pub access_type: AccessType,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub max_views: Option<i32>,

    pub view_count: i32,
    pub download_count: i32,
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
    pub revoked_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "share_access_type")]
pub enum AccessType {
    #[sea_orm(string_value = "view")]
    View,
    #[sea_orm(string_value = "download")]
    Download,
    #[sea_orm(string_value = "edit")]
    Edit,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Files,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Files => Entity::belongs_to(super::files::Entity)
                .from(Column::FileId)
                .to(super::files::Column::Id)
                .into(),
        }
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
