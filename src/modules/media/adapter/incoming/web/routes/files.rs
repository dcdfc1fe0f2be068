use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::media::adapter::incoming::web::app_state::AppState;
use crate::modules::media::adapter::incoming::web::extractors::RequestingUser;
use crate::modules::media::application::ports::incoming::IngestCommand;
use crate::modules::media::domain::entities::{FileCategory, UploadContext, Visibility};
use crate::modules::media::domain::errors::MediaError;
use crate::shared::api::ApiResponse;

pub(crate) fn error_response(err: MediaError) -> HttpResponse {
    use actix_web::http::StatusCode;

    let status = match &err {
        MediaError::FileNotFound
        | MediaError::AlbumNotFound
        | MediaError::ShareNotFound
        | MediaError::ConversationNotFound => StatusCode::NOT_FOUND,
        MediaError::AccessDenied
        | MediaError::ShareExpired
        | MediaError::ShareRevoked
        | MediaError::ShareExhausted
        | MediaError::ShareRequiresPassword => StatusCode::FORBIDDEN,
        MediaError::FileTooLarge
        | MediaError::InvalidContentType(_)
        | MediaError::InvalidVisibility(_) => StatusCode::BAD_REQUEST,
        MediaError::QuotaExceeded => StatusCode::CONFLICT,
        MediaError::Timeout | MediaError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        MediaError::StorageError(_) | MediaError::IoError(_) | MediaError::PersistenceError(_) | MediaError::DatabaseError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    ApiResponse::<()>::error(status, "MEDIA_ERROR", &err.to_string())
}

/// Multipart fields this endpoint understands: a single `file` part carries
/// the payload, everything else is read as a declared-size/visibility hint.
#[post("/api/files")]
pub async fn upload_file_handler(
    user: RequestingUser,
    req: HttpRequest,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> impl Responder {
    let ip = req.connection_info().realip_remote_addr().map(|s| s.to_string());
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let device_id = req
        .headers()
        .get("x-device-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let mut file_name = String::from("upload.bin");
    let mut mime_type = String::from("application/octet-stream");
    let mut visibility = Visibility::Private;
    let mut body_chunks: Vec<bytes::Bytes> = Vec::new();
    let mut declared_size: u64 = 0;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = field.content_disposition().cloned();
        let field_name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or("")
            .to_string();

        if field_name == "file" {
            if let Some(name) = content_disposition.as_ref().and_then(|cd| cd.get_filename()) {
                file_name = name.to_string();
            }
            if let Some(mime) = field.content_type() {
                mime_type = mime.essence_str().to_string();
            }
            while let Some(chunk) = field.next().await {
                match chunk {
                    Ok(bytes) => {
                        declared_size += bytes.len() as u64;
                        body_chunks.push(bytes);
                    }
                    Err(e) => {
                        return ApiResponse::<()>::bad_request("INVALID_MULTIPART", &e.to_string());
                    }
                }
            }
        } else if field_name == "visibility" {
            let mut raw = Vec::new();
            while let Some(chunk) = field.next().await {
                if let Ok(bytes) = chunk {
                    raw.extend_from_slice(&bytes);
                }
            }
            visibility = match String::from_utf8_lossy(&raw).as_ref() {
                "public" => Visibility::Public,
                "unlisted" => Visibility::Unlisted,
                _ => Visibility::Private,
            };
        }
    }

    let stream = futures::stream::iter(body_chunks.into_iter().map(Ok::<_, std::io::Error>));
    let command = IngestCommand {
        uploader_user_id: user.0,
        context: UploadContext::UserUpload,
        original_file_name: file_name,
        mime_type,
        declared_size_bytes: declared_size,
        visibility,
        device_id,
        ip,
        user_agent,
        data: Box::pin(stream),
    };

    match data.ingest.ingest(command).await {
        Ok(file) => ApiResponse::created(file),
        Err(err) => error_response(err),
    }
}

#[get("/api/files/{file_id}")]
pub async fn get_file_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.lifecycle.get_file(user.0, path.into_inner()).await {
        Ok(file) => ApiResponse::success(file),
        Err(err) => error_response(err),
    }
}

#[get("/api/files/{file_id}/download")]
pub async fn download_file_handler(
    user: RequestingUser,
    req: HttpRequest,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    let ip = req.connection_info().realip_remote_addr().map(|s| s.to_string());
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let device_id = req
        .headers()
        .get("x-device-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match data.lifecycle.download(user.0, path.into_inner(), ip, user_agent, device_id).await {
        Ok((file, stream)) => {
            let body_stream = stream.map(|chunk| chunk.map_err(actix_web::error::ErrorInternalServerError));
            HttpResponse::Ok()
                .content_type(file.mime_type.clone())
                .streaming(body_stream)
        }
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub struct ListFilesQuery {
    pub category: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[get("/api/files")]
pub async fn list_files_handler(
    user: RequestingUser,
    query: web::Query<ListFilesQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let category = query.category.as_deref().and_then(|c| match c {
        "image" => Some(FileCategory::Image),
        "video" => Some(FileCategory::Video),
        "audio" => Some(FileCategory::Audio),
        "document" => Some(FileCategory::Document),
        "other" => Some(FileCategory::Other),
        _ => None,
    });

    match data
        .lifecycle
        .list_for_owner(user.0, category, query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await
    {
        Ok(files) => ApiResponse::success(files),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub struct DeleteFileQuery {
    pub permanent: Option<bool>,
}

#[delete("/api/files/{file_id}")]
pub async fn delete_file_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    query: web::Query<DeleteFileQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data
        .lifecycle
        .soft_delete(user.0, path.into_inner(), query.permanent.unwrap_or(false))
        .await
    {
        Ok(()) => ApiResponse::<()>::no_content(),
        Err(err) => error_response(err),
    }
}

#[post("/api/files/{file_id}/restore")]
pub async fn restore_file_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.lifecycle.restore(user.0, path.into_inner()).await {
        Ok(()) => ApiResponse::<()>::no_content(),
        Err(err) => error_response(err),
    }
}
