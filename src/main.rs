pub mod modules;
pub mod shared;

use actix_web::{web, App, HttpServer};
use sea_orm::{ConnectOptions, Database};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modules::media::adapter::incoming::web::{routes, AppState};
use modules::media::adapter::outgoing::blob::GcsBlobStore;
use modules::media::adapter::outgoing::db::{
    PostgresAccessLogStore, PostgresAlbumStore, PostgresFileStore, PostgresShareStore,
    PostgresStorageStatStore, PostgresThumbnailJobQueue,
};
use modules::media::application::services::album::AlbumManager;
use modules::media::application::services::ingest::IngestPipeline;
use modules::media::application::services::lifecycle::LifecycleManager;
use modules::media::application::services::quota::QuotaAccountant;
use modules::media::application::services::resilience::ResilienceWrapper;
use modules::media::application::services::share::ShareManager;
use modules::media::application::services::thumbnail::ThumbnailPipeline;
use modules::media::domain::policies::config::MediaServiceConfig;
use modules::media::domain::policies::upload_policy::UploadPolicy;

#[actix_web::main]
#[cfg(not(tarpaulin_include))]
async fn start() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting media service");

    dotenvy::dotenv().ok();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL is not set in .env file");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let server_url = format!("{host}:{port}");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(50)
        .min_connections(10)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let conn = Database::connect(opt)
        .await
        .expect("failed to connect to database");
    let db = Arc::new(conn);

    let config = Arc::new(MediaServiceConfig::from_env());
    let resilience = Arc::new(ResilienceWrapper::new((*config).clone()));

    let files = Arc::new(PostgresFileStore::new(Arc::clone(&db)));
    let albums = Arc::new(PostgresAlbumStore::new(Arc::clone(&db)));
    let shares = Arc::new(PostgresShareStore::new(Arc::clone(&db)));
    let access_log = Arc::new(PostgresAccessLogStore::new(Arc::clone(&db)));
    let storage_stats = Arc::new(PostgresStorageStatStore::new(Arc::clone(&db)));
    let thumbnail_queue = Arc::new(PostgresThumbnailJobQueue::new(Arc::clone(&db)));

    let blobs = Arc::new(GcsBlobStore::new(
        config.upload_bucket.clone(),
        config.presigned_url_ttl,
    ));

    let quota = Arc::new(QuotaAccountant::new(
        Arc::clone(&files),
        Arc::clone(&storage_stats),
        Arc::clone(&config),
        Arc::clone(&resilience),
    ));

    let ingest = IngestPipeline::new(
        Arc::clone(&files),
        Arc::clone(&blobs),
        Arc::clone(&thumbnail_queue),
        Arc::clone(&access_log),
        Arc::clone(&quota),
        UploadPolicy::default(),
        Arc::clone(&config),
        Arc::clone(&resilience),
    );

    let thumbnails = ThumbnailPipeline::new(
        Arc::clone(&files),
        Arc::clone(&blobs),
        Arc::clone(&thumbnail_queue),
        Arc::clone(&config),
        Arc::clone(&resilience),
    );

    let lifecycle = LifecycleManager::new(
        Arc::clone(&files),
        Arc::clone(&blobs),
        Arc::clone(&access_log),
        Arc::clone(&config),
        Arc::clone(&resilience),
    );

    let share_manager = ShareManager::new(Arc::clone(&files), Arc::clone(&shares), Arc::clone(&config), Arc::clone(&resilience));

    let album_manager = AlbumManager::new(Arc::clone(&albums), Arc::clone(&resilience));

    let state = AppState {
        ingest: Arc::new(ingest),
        thumbnails: Arc::new(thumbnails),
        lifecycle: Arc::new(lifecycle),
        shares: Arc::new(share_manager),
        albums: Arc::new(album_manager),
        quota,
        db: Arc::clone(&db),
    };

    info!(%server_url, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(shared::api::json_config::custom_json_config())
            .configure(routes::configure)
    })
    .bind(server_url)?
    .run()
    .await
}

#[cfg(not(tarpaulin_include))]
fn main() {
    if let Err(e) = start() {
        eprintln!("error starting app: {e}");
    }
}
