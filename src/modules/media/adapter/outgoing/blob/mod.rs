pub mod gcs_blob_store;

pub use gcs_blob_store::GcsBlobStore;
