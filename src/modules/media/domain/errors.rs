use thiserror::Error;

/// Single return discipline for every public media service operation, so
/// sibling modules don't disagree on error shape.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    #[error("file exceeds the maximum allowed size")]
    FileTooLarge,

    #[error("unsupported content type: {0}")]
    InvalidContentType(String),

    #[error("invalid visibility value: {0}")]
    InvalidVisibility(String),

    #[error("access denied")]
    AccessDenied,

    #[error("file not found")]
    FileNotFound,

    #[error("album not found")]
    AlbumNotFound,

    #[error("share not found")]
    ShareNotFound,

    #[error("conversation not found")]
    ConversationNotFound,

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("failed to read upload stream: {0}")]
    IoError(String),

    #[error("failed to persist metadata: {0}")]
    PersistenceError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("operation timed out")]
    Timeout,

    #[error("service temporarily unavailable")]
    ServiceUnavailable,

    #[error("share has expired")]
    ShareExpired,

    #[error("share was revoked")]
    ShareRevoked,

    #[error("share has reached its view/download cap")]
    ShareExhausted,

    #[error("share requires a password")]
    ShareRequiresPassword,
}

impl MediaError {
    /// HTTP-transport-agnostic classification used by the thin web layer
    /// to pick a status code, and by tests to assert error families
    /// without matching every variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound | Self::AlbumNotFound | Self::ShareNotFound | Self::ConversationNotFound
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ServiceUnavailable)
    }
}
