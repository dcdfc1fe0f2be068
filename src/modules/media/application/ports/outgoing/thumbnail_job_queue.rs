use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// The queue `ThumbnailPipeline` consumers poll. Thumbnail generation runs
/// asynchronously, triggered by whatever scheduler drains this queue; this
/// port is that scheduler's handoff point, mirroring a separate worker
/// process pulling jobs off a queue.
#[async_trait]
pub trait ThumbnailJobQueue: Send + Sync {
    async fn enqueue(&self, file_id: Uuid) -> Result<(), QueueError>;

    /// Atomically claims up to `max` queued jobs, marking them `claimed` so
    /// a second worker polling concurrently does not pick them up too.
    async fn claim_batch(&self, max: u32) -> Result<Vec<ThumbnailJob>, QueueError>;

    async fn mark_done(&self, job_id: Uuid) -> Result<(), QueueError>;

    async fn mark_failed(&self, job_id: Uuid, reason: ThumbnailFailureReason) -> Result<(), QueueError>;
}

#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub job_id: Uuid,
    pub file_id: Uuid,
    pub attempts: u32,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Structured failure taxonomy so `processing_error` carries more than a
/// free-text string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailFailureReason {
    UnsupportedFormat,
    CorruptSource,
    DecodeTimeout,
    DownloadFailed(String),
    EncodeFailed(String),
}

impl std::fmt::Display for ThumbnailFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "invalid image format"),
            Self::CorruptSource => write!(f, "invalid image format"),
            Self::DecodeTimeout => write!(f, "decode exceeded time budget"),
            Self::DownloadFailed(e) => write!(f, "failed to download source: {e}"),
            Self::EncodeFailed(e) => write!(f, "failed to encode variant: {e}"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(String),
    #[error("job not found")]
    NotFound,
}
