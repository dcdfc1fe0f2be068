pub mod access_log;
pub mod album_files;
pub mod albums;
pub mod files;
pub mod processing_queue;
pub mod shares;
pub mod storage_stats;

pub mod prelude {
    pub use super::access_log::Entity as AccessLog;
    pub use super::album_files::Entity as AlbumFiles;
    pub use super::albums::Entity as Albums;
    pub use super::files::Entity as Files;
    pub use super::processing_queue::Entity as ProcessingQueue;
    pub use super::shares::Entity as Shares;
    pub use super::storage_stats::Entity as StorageStats;
}
