use actix_web::{delete, get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::media::adapter::incoming::web::app_state::AppState;
use crate::modules::media::adapter::incoming::web::extractors::RequestingUser;
use crate::modules::media::adapter::incoming::web::routes::files::error_response;
use crate::modules::media::application::ports::incoming::CreateShareCommand;
use crate::modules::media::domain::entities::ShareAccessType;
use crate::shared::api::ApiResponse;

#[derive(Deserialize)]
pub struct CreateShareRequest {
    pub file_id: Uuid,
    pub access_type: ShareAccessType,
    pub shared_with_user_id: Option<Uuid>,
    pub shared_with_conversation_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<u32>,
    pub password: Option<String>,
}

#[post("/api/shares")]
pub async fn create_share_handler(
    user: RequestingUser,
    req: web::Json<CreateShareRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let req = req.into_inner();
    let command = CreateShareCommand {
        requester: user.0,
        file_id: req.file_id,
        access_type: req.access_type,
        shared_with_user_id: req.shared_with_user_id,
        shared_with_conversation_id: req.shared_with_conversation_id,
        expires_at: req.expires_at,
        max_views: req.max_views,
        password: req.password,
    };

    match data.shares.create_share(command).await {
        Ok(share) => ApiResponse::created(share),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub struct ResolveShareQuery {
    pub password: Option<String>,
}

#[get("/api/shares/{token}")]
pub async fn resolve_share_handler(
    path: web::Path<String>,
    query: web::Query<ResolveShareQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data
        .shares
        .resolve_share(&path.into_inner(), query.password.as_deref())
        .await
    {
        Ok((file, share)) => ApiResponse::success((file, share)),
        Err(err) => error_response(err),
    }
}

#[delete("/api/shares/{share_id}")]
pub async fn revoke_share_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.shares.revoke(user.0, path.into_inner()).await {
        Ok(()) => ApiResponse::<()>::no_content(),
        Err(err) => error_response(err),
    }
}

#[get("/api/files/{file_id}/shares")]
pub async fn list_shares_for_file_handler(
    user: RequestingUser,
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> impl Responder {
    match data.shares.list_for_file(user.0, path.into_inner()).await {
        Ok(shares) => ApiResponse::success(shares),
        Err(err) => error_response(err),
    }
}
