use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::media::adapter::incoming::web::app_state::AppState;
use crate::modules::media::adapter::incoming::web::extractors::RequestingUser;
use crate::modules::media::adapter::incoming::web::routes::files::error_response;
use crate::modules::media::application::ports::incoming::CreateAlbumCommand;
use crate::modules::media::domain::entities::Visibility;
use crate::shared::api::ApiResponse;

#[derive(Deserialize)]
pub struct CreateAlbumRequest {
    pub title: String,
    pub description: Option<String>,
    pub album_type: String,
    pub visibility: Visibility,
}

#[post("/api/albums")]
pub async fn create_album_handler(
    user: RequestingUser,
    req: web::Json<CreateAlbumRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let req = req.into_inner();
    let command = CreateAlbumCommand {
        owner: user.0,
        title: req.title,
        description: req.description,
        album_type: req.album_type,
        visibility: req.visibility,
    };

    match data.albums.create(command).await {
        Ok(album) => ApiResponse::created(album),
        Err(err) => error_response(err),
    }
}

#[get("/api/albums/{album_id}")]
pub async fn get_album_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.albums.get(user.0, path.into_inner()).await {
        Ok(album) => ApiResponse::success(album),
        Err(err) => error_response(err),
    }
}

#[get("/api/albums")]
pub async fn list_albums_handler(user: RequestingUser, data: web::Data<AppState>) -> impl Responder {
    match data.albums.list_for_owner(user.0).await {
        Ok(albums) => ApiResponse::success(albums),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub struct RenameAlbumRequest {
    pub title: String,
    pub description: Option<String>,
}

#[patch("/api/albums/{album_id}")]
pub async fn rename_album_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    req: web::Json<RenameAlbumRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let req = req.into_inner();
    match data
        .albums
        .rename(user.0, path.into_inner(), req.title, req.description)
        .await
    {
        Ok(album) => ApiResponse::success(album),
        Err(err) => error_response(err),
    }
}

#[delete("/api/albums/{album_id}")]
pub async fn delete_album_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.albums.delete(user.0, path.into_inner()).await {
        Ok(()) => ApiResponse::<()>::no_content(),
        Err(err) => error_response(err),
    }
}

#[post("/api/albums/{album_id}/files/{file_id}")]
pub async fn add_file_to_album_handler(
    user: RequestingUser,
    path: web::Path<(Uuid, Uuid)>,
    data: web::Data<AppState>,
) -> impl Responder {
    let (album_id, file_id) = path.into_inner();
    match data.albums.add_file(user.0, album_id, file_id).await {
        Ok(album_file) => ApiResponse::created(album_file),
        Err(err) => error_response(err),
    }
}

#[delete("/api/albums/{album_id}/files/{file_id}")]
pub async fn remove_file_from_album_handler(
    user: RequestingUser,
    path: web::Path<(Uuid, Uuid)>,
    data: web::Data<AppState>,
) -> impl Responder {
    let (album_id, file_id) = path.into_inner();
    match data.albums.remove_file(user.0, album_id, file_id).await {
        Ok(()) => ApiResponse::<()>::no_content(),
        Err(err) => error_response(err),
    }
}

#[get("/api/albums/{album_id}/files")]
pub async fn list_album_files_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.albums.list_files(user.0, path.into_inner()).await {
        Ok(files) => ApiResponse::success(files),
        Err(err) => error_response(err),
    }
}
