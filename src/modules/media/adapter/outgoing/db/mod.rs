pub mod postgres_access_log_store;
pub mod postgres_album_store;
pub mod postgres_file_store;
pub mod postgres_share_store;
pub mod postgres_storage_stat_store;
pub mod postgres_thumbnail_job_queue;

pub use postgres_access_log_store::PostgresAccessLogStore;
pub use postgres_album_store::PostgresAlbumStore;
pub use postgres_file_store::PostgresFileStore;
pub use postgres_share_store::PostgresShareStore;
pub use postgres_storage_stat_store::PostgresStorageStatStore;
pub use postgres_thumbnail_job_queue::PostgresThumbnailJobQueue;
