use std::sync::Arc;

use async_trait::async_trait;
use entity::album_files::{ActiveModel as AlbumFileActiveModel, Column as AlbumFileColumn, Entity as AlbumFileEntity};
use entity::albums::{ActiveModel, Column, Entity as AlbumEntity, Model};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::modules::media::application::ports::outgoing::metadata_store::{AlbumStore, StoreError};
use crate::modules::media::domain::entities::{Album, AlbumFile, UserId, Visibility};

#[derive(Clone)]
pub struct PostgresAlbumStore {
    db: Arc<DatabaseConnection>,
}

impl PostgresAlbumStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AlbumStore for PostgresAlbumStore {
    async fn insert(&self, album: &Album) -> Result<(), StoreError> {
        let active = to_active_model(album);
        AlbumEntity::insert(active).exec(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, album_id: Uuid) -> Result<Option<Album>, StoreError> {
        let model = AlbumEntity::find_by_id(album_id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(model.map(to_domain))
    }

    async fn update(&self, album: &Album) -> Result<(), StoreError> {
        let active = to_active_model(album);
        active.update(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete(&self, album_id: Uuid) -> Result<(), StoreError> {
        AlbumEntity::delete_by_id(album_id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Album>, StoreError> {
        let models = AlbumEntity::find()
            .filter(Column::UserId.eq(owner))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn add_file(&self, album_file: &AlbumFile) -> Result<(), StoreError> {
        let active = AlbumFileActiveModel {
            id: sea_orm::NotSet,
            album_id: Set(album_file.album_id),
            file_id: Set(album_file.file_id),
            display_order: Set(album_file.display_order),
            added_at: Set(album_file.added_at.into()),
        };
        AlbumFileEntity::insert(active)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn remove_file(&self, album_id: Uuid, file_id: Uuid) -> Result<(), StoreError> {
        AlbumFileEntity::delete_many()
            .filter(AlbumFileColumn::AlbumId.eq(album_id))
            .filter(AlbumFileColumn::FileId.eq(file_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_files(&self, album_id: Uuid) -> Result<Vec<AlbumFile>, StoreError> {
        let models = AlbumFileEntity::find()
            .filter(AlbumFileColumn::AlbumId.eq(album_id))
            .order_by_asc(AlbumFileColumn::DisplayOrder)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(models
            .into_iter()
            .map(|m| AlbumFile {
                album_id: m.album_id,
                file_id: m.file_id,
                display_order: m.display_order,
                added_at: m.added_at.with_timezone(&chrono::Utc),
            })
            .collect())
    }

    async fn file_count(&self, album_id: Uuid) -> Result<u32, StoreError> {
        let count = AlbumFileEntity::find()
            .filter(AlbumFileColumn::AlbumId.eq(album_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(count as u32)
    }
}

fn map_db_err(err: sea_orm::DbErr) -> StoreError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("duplicate") || lower.contains("unique") {
        StoreError::Conflict(msg)
    } else if lower.contains("timeout") {
        StoreError::Timeout
    } else if lower.contains("connection") {
        StoreError::Unavailable(msg)
    } else {
        StoreError::Database(msg)
    }
}

fn to_entity_visibility(visibility: Visibility) -> entity::files::Visibility {
    match visibility {
        Visibility::Private => entity::files::Visibility::Private,
        Visibility::Public => entity::files::Visibility::Public,
        Visibility::Unlisted => entity::files::Visibility::Unlisted,
    }
}

fn from_entity_visibility(visibility: entity::files::Visibility) -> Visibility {
    match visibility {
        entity::files::Visibility::Private => Visibility::Private,
        entity::files::Visibility::Public => Visibility::Public,
        entity::files::Visibility::Unlisted => Visibility::Unlisted,
    }
}

fn to_active_model(album: &Album) -> ActiveModel {
    ActiveModel {
        id: Set(album.album_id),
        user_id: Set(album.user_id),
        title: Set(album.title.clone()),
        description: Set(album.description.clone()),
        cover_file_id: Set(album.cover_file_id),
        album_type: Set(album.album_type.clone()),
        visibility: Set(to_entity_visibility(album.visibility)),
        file_count: Set(album.file_count as i32),
        sort_order: Set(album.sort_order),
        created_at: Set(album.created_at.into()),
        updated_at: Set(album.updated_at.into()),
    }
}

fn to_domain(model: Model) -> Album {
    Album {
        album_id: model.id,
        user_id: model.user_id,
        title: model.title,
        description: model.description,
        cover_file_id: model.cover_file_id,
        album_type: model.album_type,
        visibility: from_entity_visibility(model.visibility),
        file_count: model.file_count as u32,
        sort_order: model.sort_order,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_model(id: Uuid, owner: Uuid) -> Model {
        let now = chrono::Utc::now().into();
        Model {
            id,
            user_id: owner,
            title: "Summer trip".to_string(),
            description: None,
            cover_file_id: None,
            album_type: "custom".to_string(),
            visibility: entity::files::Visibility::Private,
            file_count: 0,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn find_by_id_returns_domain_album() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let model = test_model(id, owner);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let store = PostgresAlbumStore::new(Arc::new(db));
        let album = store.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(album.album_id, id);
        assert_eq!(album.user_id, owner);
        assert_eq!(album.title, "Summer trip");
    }

    #[tokio::test]
    async fn list_for_owner_returns_matching_albums() {
        let owner = Uuid::new_v4();
        let model = test_model(Uuid::new_v4(), owner);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model]])
            .into_connection();

        let store = PostgresAlbumStore::new(Arc::new(db));
        let albums = store.list_for_owner(owner).await.unwrap();

        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].user_id, owner);
    }
}
