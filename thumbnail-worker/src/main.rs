#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_service::media::adapter::outgoing::blob::GcsBlobStore;
use media_service::media::adapter::outgoing::db::{PostgresFileStore, PostgresThumbnailJobQueue};
use media_service::media::application::ports::incoming::ThumbnailPipelinePort;
use media_service::media::application::services::resilience::ResilienceWrapper;
use media_service::media::application::services::thumbnail::ThumbnailPipeline;
use media_service::media::domain::policies::config::MediaServiceConfig;

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL is not set in .env file");
    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await?;
    let db = Arc::new(conn);

    let config = Arc::new(MediaServiceConfig::from_env());
    let files = Arc::new(PostgresFileStore::new(Arc::clone(&db)));
    let queue = Arc::new(PostgresThumbnailJobQueue::new(Arc::clone(&db)));
    let blobs = Arc::new(GcsBlobStore::new(
        config.upload_bucket.clone(),
        config.presigned_url_ttl,
    ));

    let resilience = Arc::new(ResilienceWrapper::new((*config).clone()));
    let pipeline = ThumbnailPipeline::new(files, blobs, queue, Arc::clone(&config), resilience);

    let batch_size = env_u32("THUMBNAIL_WORKER_BATCH_SIZE", 10);
    let poll_interval = Duration::from_secs(env_u32("THUMBNAIL_WORKER_POLL_SECS", 5) as u64);
    let idle_interval = Duration::from_secs(env_u32("THUMBNAIL_WORKER_IDLE_SECS", 30) as u64);

    info!(batch_size, poll_secs = poll_interval.as_secs(), "thumbnail worker starting");

    loop {
        match pipeline.run_batch(batch_size).await {
            Ok(0) => tokio::time::sleep(idle_interval).await,
            Ok(processed) => {
                info!(processed, "thumbnail batch processed");
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => {
                error!(error = %e, "thumbnail batch failed");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}
