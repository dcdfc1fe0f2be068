use std::time::Duration;

/// Immutable configuration snapshot threaded into every component by value
/// or `Arc`, rather than shared mutable config behind pointer-held structs.
#[derive(Debug, Clone)]
pub struct MediaServiceConfig {
    pub max_file_size_bytes: u64,
    /// 10 MiB cap for profile photos.
    pub max_profile_photo_size_bytes: u64,
    /// Default per-user quota, 5 GiB unless overridden.
    pub default_quota_bytes: u64,
    pub dedup_enabled: bool,
    pub cdn_enabled: bool,
    pub cdn_base_url: String,
    pub storage_provider: String,
    pub storage_region: Option<String>,
    pub upload_bucket: String,

    /// Target pixel bounds for small/medium/large thumbnail variants.
    pub thumbnail_small_px: u32,
    pub thumbnail_medium_px: u32,
    pub thumbnail_large_px: u32,
    pub thumbnail_jpeg_quality: u8,

    /// Storage-stat snapshot staleness TTL.
    pub storage_stat_ttl: Duration,

    /// Share token entropy in bytes (>= 32 for >= 256 bits).
    pub share_token_bytes: usize,
    pub share_public_url_base: String,

    /// Soft-delete retention window before permanent purge.
    pub soft_delete_retention: Duration,

    pub retry_max_attempts: u32,
    pub retry_base_backoff: Duration,
    pub retry_max_backoff: Duration,
    pub circuit_breaker_window: Duration,
    pub circuit_breaker_min_requests: u32,
    pub circuit_breaker_failure_ratio: f64,
    pub circuit_breaker_open_duration: Duration,
    pub circuit_breaker_half_open_trials: u32,

    pub presigned_url_ttl: Duration,
    pub metadata_op_timeout: Duration,
}

impl MediaServiceConfig {
    /// Loads configuration from environment variables, falling back to
    /// documented defaults.
    pub fn from_env() -> Self {
        Self {
            max_file_size_bytes: env_u64("MEDIA_MAX_FILE_SIZE_BYTES", 500 * 1024 * 1024),
            max_profile_photo_size_bytes: env_u64(
                "MEDIA_MAX_PROFILE_PHOTO_SIZE_BYTES",
                10 * 1024 * 1024,
            ),
            default_quota_bytes: env_u64("MEDIA_DEFAULT_QUOTA_BYTES", 5 * 1024 * 1024 * 1024),
            dedup_enabled: env_bool("MEDIA_DEDUP_ENABLED", true),
            cdn_enabled: env_bool("MEDIA_CDN_ENABLED", false),
            cdn_base_url: env_string("MEDIA_CDN_BASE_URL", ""),
            storage_provider: env_string("MEDIA_STORAGE_PROVIDER", "gcs"),
            storage_region: std::env::var("MEDIA_STORAGE_REGION").ok(),
            upload_bucket: env_string("MEDIA_UPLOAD_BUCKET", "media-service-uploads"),

            thumbnail_small_px: env_u32("MEDIA_THUMBNAIL_SMALL_PX", 150),
            thumbnail_medium_px: env_u32("MEDIA_THUMBNAIL_MEDIUM_PX", 480),
            thumbnail_large_px: env_u32("MEDIA_THUMBNAIL_LARGE_PX", 1280),
            thumbnail_jpeg_quality: env_u8("MEDIA_THUMBNAIL_JPEG_QUALITY", 85),

            storage_stat_ttl: Duration::from_secs(env_u64("MEDIA_STORAGE_STAT_TTL_SECS", 3600)),

            share_token_bytes: env_u64("MEDIA_SHARE_TOKEN_BYTES", 32) as usize,
            share_public_url_base: env_string("MEDIA_SHARE_PUBLIC_URL_BASE", "https://localhost"),

            soft_delete_retention: Duration::from_secs(
                env_u64("MEDIA_SOFT_DELETE_RETENTION_SECS", 30 * 24 * 3600),
            ),

            retry_max_attempts: env_u32("MEDIA_RETRY_MAX_ATTEMPTS", 3),
            retry_base_backoff: Duration::from_millis(env_u64("MEDIA_RETRY_BASE_BACKOFF_MS", 100)),
            retry_max_backoff: Duration::from_millis(env_u64("MEDIA_RETRY_MAX_BACKOFF_MS", 2000)),
            circuit_breaker_window: Duration::from_secs(env_u64(
                "MEDIA_CIRCUIT_BREAKER_WINDOW_SECS",
                10,
            )),
            circuit_breaker_min_requests: env_u32("MEDIA_CIRCUIT_BREAKER_MIN_REQUESTS", 3),
            circuit_breaker_failure_ratio: env_f64(
                "MEDIA_CIRCUIT_BREAKER_FAILURE_RATIO",
                0.6,
            ),
            circuit_breaker_open_duration: Duration::from_secs(env_u64(
                "MEDIA_CIRCUIT_BREAKER_OPEN_SECS",
                30,
            )),
            circuit_breaker_half_open_trials: env_u32(
                "MEDIA_CIRCUIT_BREAKER_HALF_OPEN_TRIALS",
                2,
            ),

            presigned_url_ttl: Duration::from_secs(env_u64("MEDIA_PRESIGNED_URL_TTL_SECS", 900)),
            metadata_op_timeout: Duration::from_secs(env_u64("MEDIA_METADATA_OP_TIMEOUT_SECS", 10)),
        }
    }

    /// Handy for unit tests and wiring without reading the environment.
    pub fn for_tests() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            max_profile_photo_size_bytes: 2 * 1024 * 1024,
            default_quota_bytes: 1024 * 1024 * 1024,
            dedup_enabled: true,
            cdn_enabled: false,
            cdn_base_url: String::new(),
            storage_provider: "gcs".to_string(),
            storage_region: None,
            upload_bucket: "test-bucket".to_string(),
            thumbnail_small_px: 64,
            thumbnail_medium_px: 256,
            thumbnail_large_px: 1024,
            thumbnail_jpeg_quality: 85,
            storage_stat_ttl: Duration::from_secs(3600),
            share_token_bytes: 32,
            share_public_url_base: "https://test.example".to_string(),
            soft_delete_retention: Duration::from_secs(30 * 24 * 3600),
            retry_max_attempts: 3,
            retry_base_backoff: Duration::from_millis(1),
            retry_max_backoff: Duration::from_millis(4),
            circuit_breaker_window: Duration::from_secs(10),
            circuit_breaker_min_requests: 3,
            circuit_breaker_failure_ratio: 0.6,
            circuit_breaker_open_duration: Duration::from_secs(30),
            circuit_breaker_half_open_trials: 2,
            presigned_url_ttl: Duration::from_secs(900),
            metadata_op_timeout: Duration::from_secs(10),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u8(key: &str, default: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
