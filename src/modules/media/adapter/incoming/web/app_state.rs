use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::modules::media::application::ports::incoming::{
    AlbumManagerPort, IngestPipelinePort, LifecycleManagerPort, QuotaAccountantPort,
    ShareManagerPort, ThumbnailPipelinePort,
};

/// Composition-root state: a concrete struct holding `Arc<dyn Port>`
/// fields injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<dyn IngestPipelinePort>,
    pub thumbnails: Arc<dyn ThumbnailPipelinePort>,
    pub lifecycle: Arc<dyn LifecycleManagerPort>,
    pub shares: Arc<dyn ShareManagerPort>,
    pub albums: Arc<dyn AlbumManagerPort>,
    pub quota: Arc<dyn QuotaAccountantPort>,
    pub db: Arc<DatabaseConnection>,
}
