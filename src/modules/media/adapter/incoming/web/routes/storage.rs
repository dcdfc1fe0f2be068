use actix_web::{get, web, Responder};

use crate::modules::media::adapter::incoming::web::app_state::AppState;
use crate::modules::media::adapter::incoming::web::extractors::RequestingUser;
use crate::modules::media::adapter::incoming::web::routes::files::error_response;
use crate::shared::api::ApiResponse;

#[get("/api/storage/stats")]
pub async fn get_storage_stats_handler(user: RequestingUser, data: web::Data<AppState>) -> impl Responder {
    match data.quota.get_stats(user.0).await {
        Ok(stats) => ApiResponse::success(stats),
        Err(err) => error_response(err),
    }
}
