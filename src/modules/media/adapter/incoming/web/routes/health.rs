use actix_web::{get, web, HttpResponse, Responder};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::modules::media::adapter::incoming::web::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadinessResponse {
    status: &'static str,
    database: &'static str,
}

/// Liveness probe: the process is running and answering HTTP. Never
/// touches the database.
#[get("/health")]
pub async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// Readiness probe: the process is running AND its database is
/// reachable. Used by the deployment platform to gate traffic, not by
/// clients.
#[get("/ready")]
pub async fn ready_handler(data: web::Data<AppState>) -> impl Responder {
    let db_status = match data
        .db
        .execute(Statement::from_string(data.db.get_database_backend(), "SELECT 1"))
        .await
    {
        Ok(_) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed: database unreachable");
            "unhealthy"
        }
    };

    if db_status == "ok" {
        HttpResponse::Ok().json(ReadinessResponse { status: "ok", database: db_status })
    } else {
        HttpResponse::ServiceUnavailable().json(ReadinessResponse { status: "unhealthy", database: db_status })
    }
}
