use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::modules::media::application::ports::incoming::{AlbumManagerPort, CreateAlbumCommand};
use crate::modules::media::application::ports::outgoing::metadata_store::AlbumStore;
use crate::modules::media::application::services::resilience::ResilienceWrapper;
use crate::modules::media::domain::entities::{Album, AlbumFile};
use crate::modules::media::domain::errors::MediaError;

/// Ownership-checked CRUD over albums and membership. `add_file`
/// intentionally does not check that the file belongs to the album
/// owner — left permissive so albums can curate shared or public files.
pub struct AlbumManager<As>
where
    As: AlbumStore,
{
    albums: Arc<As>,
    resilience: Arc<ResilienceWrapper>,
}

impl<As> AlbumManager<As>
where
    As: AlbumStore,
{
    pub fn new(albums: Arc<As>, resilience: Arc<ResilienceWrapper>) -> Self {
        Self { albums, resilience }
    }

    async fn authorize(&self, requester: Uuid, album_id: Uuid) -> Result<Album, MediaError> {
        let album = self
            .resilience
            .call(|| self.albums.find_by_id(album_id))
            .await?
            .ok_or(MediaError::AlbumNotFound)?;
        if album.user_id != requester {
            return Err(MediaError::AccessDenied);
        }
        Ok(album)
    }
}

#[async_trait]
impl<As> AlbumManagerPort for AlbumManager<As>
where
    As: AlbumStore,
{
    async fn create(&self, command: CreateAlbumCommand) -> Result<Album, MediaError> {
        let now = Utc::now();
        let album = Album {
            album_id: Uuid::new_v4(),
            user_id: command.owner,
            title: command.title,
            description: command.description,
            cover_file_id: None,
            album_type: command.album_type,
            visibility: command.visibility,
            file_count: 0,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };

        self.resilience.call(|| self.albums.insert(&album)).await?;

        Ok(album)
    }

    async fn get(&self, requester: Uuid, album_id: Uuid) -> Result<Album, MediaError> {
        self.authorize(requester, album_id).await
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Album>, MediaError> {
        self.resilience.call(|| self.albums.list_for_owner(owner)).await
    }

    async fn rename(
        &self,
        requester: Uuid,
        album_id: Uuid,
        title: String,
        description: Option<String>,
    ) -> Result<Album, MediaError> {
        let mut album = self.authorize(requester, album_id).await?;
        album.title = title;
        album.description = description;
        album.updated_at = Utc::now();

        self.resilience.call(|| self.albums.update(&album)).await?;

        Ok(album)
    }

    async fn delete(&self, requester: Uuid, album_id: Uuid) -> Result<(), MediaError> {
        self.authorize(requester, album_id).await?;
        self.resilience.call(|| self.albums.delete(album_id)).await
    }

    async fn add_file(&self, requester: Uuid, album_id: Uuid, file_id: Uuid) -> Result<AlbumFile, MediaError> {
        self.authorize(requester, album_id).await?;

        let album_file = AlbumFile {
            album_id,
            file_id,
            display_order: None,
            added_at: Utc::now(),
        };

        self.resilience.call(|| self.albums.add_file(&album_file)).await?;

        Ok(album_file)
    }

    async fn remove_file(&self, requester: Uuid, album_id: Uuid, file_id: Uuid) -> Result<(), MediaError> {
        self.authorize(requester, album_id).await?;
        self.resilience.call(|| self.albums.remove_file(album_id, file_id)).await
    }

    async fn list_files(&self, requester: Uuid, album_id: Uuid) -> Result<Vec<AlbumFile>, MediaError> {
        self.authorize(requester, album_id).await?;
        self.resilience.call(|| self.albums.list_files(album_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::modules::media::application::ports::outgoing::metadata_store::StoreError;
    use crate::modules::media::domain::entities::Visibility;
    use crate::modules::media::domain::policies::config::MediaServiceConfig;

    #[derive(Default)]
    struct FakeAlbumStore {
        albums: Mutex<Vec<Album>>,
    }

    #[async_trait]
    impl AlbumStore for FakeAlbumStore {
        async fn insert(&self, album: &Album) -> Result<(), StoreError> {
            self.albums.lock().unwrap().push(album.clone());
            Ok(())
        }
        async fn find_by_id(&self, album_id: Uuid) -> Result<Option<Album>, StoreError> {
            Ok(self.albums.lock().unwrap().iter().find(|a| a.album_id == album_id).cloned())
        }
        async fn update(&self, album: &Album) -> Result<(), StoreError> {
            let mut albums = self.albums.lock().unwrap();
            if let Some(existing) = albums.iter_mut().find(|a| a.album_id == album.album_id) {
                *existing = album.clone();
            }
            Ok(())
        }
        async fn delete(&self, album_id: Uuid) -> Result<(), StoreError> {
            self.albums.lock().unwrap().retain(|a| a.album_id != album_id);
            Ok(())
        }
        async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<Album>, StoreError> {
            Ok(self.albums.lock().unwrap().iter().filter(|a| a.user_id == owner).cloned().collect())
        }
        async fn add_file(&self, _album_file: &AlbumFile) -> Result<(), StoreError> {
            Ok(())
        }
        async fn remove_file(&self, _album_id: Uuid, _file_id: Uuid) -> Result<(), StoreError> {
            Ok(())
        }
        async fn list_files(&self, _album_id: Uuid) -> Result<Vec<AlbumFile>, StoreError> {
            Ok(vec![])
        }
        async fn file_count(&self, _album_id: Uuid) -> Result<u32, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn non_owner_cannot_rename_album() {
        let store = Arc::new(FakeAlbumStore::default());
        let resilience = Arc::new(ResilienceWrapper::new(MediaServiceConfig::for_tests()));
        let manager = AlbumManager::new(store.clone(), resilience);

        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let album = manager
            .create(CreateAlbumCommand {
                owner,
                title: "Trip".to_string(),
                description: None,
                album_type: "custom".to_string(),
                visibility: Visibility::Private,
            })
            .await
            .unwrap();

        let result = manager
            .rename(stranger, album.album_id, "Hijacked".to_string(), None)
            .await;
        assert!(matches!(result, Err(MediaError::AccessDenied)));
    }
}
