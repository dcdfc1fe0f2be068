pub mod blob_store;
pub mod metadata_store;
pub mod thumbnail_job_queue;
