use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// Outgoing port for the bytes themselves, as distinct from their metadata.
/// Generalized from a signed-URL-for-client-direct-upload flow to direct
/// server-side streaming, matching this service's upload model.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        data: BoxStream<'static, Result<Bytes, std::io::Error>>,
    ) -> Result<(), BlobError>;

    async fn download(&self, key: &str) -> Result<BoxStream<'static, Result<Bytes, std::io::Error>>, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Returns a time-limited URL a client can use to fetch the object
    /// directly, bypassing this service for the transfer itself.
    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String, BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError>;
}

#[derive(Debug, Clone, Error)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("blob backend io error: {0}")]
    Io(String),
    #[error("blob backend unavailable: {0}")]
    Unavailable(String),
    #[error("blob backend rejected request: {0}")]
    InvalidRequest(String),
}

impl BlobError {
    /// Classifies which failures the retry/circuit-breaker wrapper should
    /// consider worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}
