use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::OnceCell;

use crate::modules::media::application::ports::outgoing::blob_store::{BlobError, BlobStore};

fn bucket_resource(bucket: &str) -> String {
    format!("projects/_/buckets/{}", bucket)
}

fn map_blob_error(msg: &str) -> BlobError {
    let m = msg.to_lowercase();
    if m.contains("404") || m.contains("not found") {
        BlobError::NotFound(msg.to_string())
    } else if m.contains("permission") || m.contains("forbidden") || m.contains("denied") || m.contains("invalid") {
        BlobError::InvalidRequest(msg.to_string())
    } else if m.contains("timeout") || m.contains("dns") || m.contains("connection") || m.contains("network") {
        BlobError::Unavailable(msg.to_string())
    } else {
        BlobError::Io(msg.to_string())
    }
}

/// Internal seam so this adapter is testable without mocking
/// `google-cloud-storage`'s own types. Moves object bytes directly in
/// addition to signing URLs.
#[async_trait]
trait GcsClient: Send + Sync {
    async fn put_object(&self, bucket_resource: &str, object_name: &str, content_type: &str, data: Vec<u8>) -> Result<(), String>;
    async fn get_object(&self, bucket_resource: &str, object_name: &str) -> Result<Vec<u8>, String>;
    async fn delete_object(&self, bucket_resource: &str, object_name: &str) -> Result<(), String>;
    async fn sign_get_url(&self, bucket_resource: &str, object_name: &str, ttl: Duration) -> Result<String, String>;
    async fn object_exists(&self, bucket_resource: &str, object_name: &str) -> Result<bool, String>;
}

#[cfg(test)]
struct ArcGcsClient(Arc<dyn GcsClient>);

#[cfg(test)]
#[async_trait]
impl GcsClient for ArcGcsClient {
    async fn put_object(&self, bucket_resource: &str, object_name: &str, content_type: &str, data: Vec<u8>) -> Result<(), String> {
        self.0.put_object(bucket_resource, object_name, content_type, data).await
    }
    async fn get_object(&self, bucket_resource: &str, object_name: &str) -> Result<Vec<u8>, String> {
        self.0.get_object(bucket_resource, object_name).await
    }
    async fn delete_object(&self, bucket_resource: &str, object_name: &str) -> Result<(), String> {
        self.0.delete_object(bucket_resource, object_name).await
    }
    async fn sign_get_url(&self, bucket_resource: &str, object_name: &str, ttl: Duration) -> Result<String, String> {
        self.0.sign_get_url(bucket_resource, object_name, ttl).await
    }
    async fn object_exists(&self, bucket_resource: &str, object_name: &str) -> Result<bool, String> {
        self.0.object_exists(bucket_resource, object_name).await
    }
}

/// Production `BlobStore` backed by Google Cloud Storage.
#[derive(Clone)]
pub struct GcsBlobStore {
    client: Arc<OnceCell<Box<dyn GcsClient>>>,
    bucket: String,
    default_presign_ttl: Duration,
}

impl GcsBlobStore {
    pub fn new(bucket: String, default_presign_ttl: Duration) -> Self {
        Self {
            client: Arc::new(OnceCell::new()),
            bucket,
            default_presign_ttl,
        }
    }

    async fn get_client(&self) -> Result<&dyn GcsClient, BlobError> {
        self.client
            .get_or_try_init(|| async {
                let real = RealGcsClient::new()
                    .await
                    .map_err(|e| e.to_string())?;
                Ok::<_, String>(Box::new(real) as Box<dyn GcsClient>)
            })
            .await
            .map(|boxed| &**boxed)
            .map_err(|e| BlobError::Unavailable(e))
    }

    #[cfg(test)]
    fn with_client(client: Arc<dyn GcsClient>, bucket: String) -> Self {
        let once = OnceCell::new();
        let _ = once.set(Box::new(ArcGcsClient(client)) as Box<dyn GcsClient>);
        Self {
            client: Arc::new(once),
            bucket,
            default_presign_ttl: Duration::from_secs(900),
        }
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        mut data: BoxStream<'static, Result<Bytes, std::io::Error>>,
    ) -> Result<(), BlobError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = data.next().await {
            let chunk = chunk.map_err(|e| BlobError::Io(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }

        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        client
            .put_object(&bucket, key, content_type, buffer)
            .await
            .map_err(|e| map_blob_error(&e))
    }

    async fn download(&self, key: &str) -> Result<BoxStream<'static, Result<Bytes, std::io::Error>>, BlobError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        let bytes = client
            .get_object(&bucket, key)
            .await
            .map_err(|e| map_blob_error(&e))?;

        let stream = futures::stream::once(async move { Ok(Bytes::from(bytes)) });
        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        client
            .delete_object(&bucket, key)
            .await
            .map_err(|e| map_blob_error(&e))
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String, BlobError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        let ttl = if ttl.is_zero() { self.default_presign_ttl } else { ttl };
        client
            .sign_get_url(&bucket, key, ttl)
            .await
            .map_err(|e| map_blob_error(&e))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let client = self.get_client().await?;
        let bucket = bucket_resource(&self.bucket);
        client
            .object_exists(&bucket, key)
            .await
            .map_err(|e| map_blob_error(&e))
    }
}

struct RealGcsClient {
    storage: google_cloud_storage::client::Storage,
    signer: google_cloud_auth::signer::Signer,
}

impl RealGcsClient {
    async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("initializing GCS client");

        let storage = google_cloud_storage::client::Storage::builder()
            .build()
            .await
            .map_err(|e| {
                tracing::error!("failed to build GCS storage client: {:?}", e);
                e
            })?;

        let signer = google_cloud_auth::credentials::Builder::default()
            .build_signer()
            .map_err(|e| {
                tracing::error!("failed to build GCS signer: {:?}", e);
                e
            })?;

        Ok(Self { storage, signer })
    }
}

#[async_trait]
impl GcsClient for RealGcsClient {
    async fn put_object(&self, bucket_resource: &str, object_name: &str, content_type: &str, data: Vec<u8>) -> Result<(), String> {
        self.storage
            .write_object(bucket_resource.to_string(), object_name.to_string(), data)
            .set_content_type(content_type.to_string())
            .send_unbuffered()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn get_object(&self, bucket_resource: &str, object_name: &str) -> Result<Vec<u8>, String> {
        let mut stream = self
            .storage
            .read_object(bucket_resource.to_string(), object_name.to_string())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    async fn delete_object(&self, bucket_resource: &str, object_name: &str) -> Result<(), String> {
        self.storage
            .delete_object(bucket_resource.to_string(), object_name.to_string())
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn sign_get_url(&self, bucket_resource: &str, object_name: &str, ttl: Duration) -> Result<String, String> {
        google_cloud_storage::builder::storage::SignedUrlBuilder::for_object(
            bucket_resource.to_string(),
            object_name.to_string(),
        )
        .with_method(google_cloud_storage::http::Method::GET)
        .with_expiration(ttl)
        .sign_with(&self.signer)
        .await
        .map_err(|e| e.to_string())
    }

    async fn object_exists(&self, bucket_resource: &str, object_name: &str) -> Result<bool, String> {
        match self
            .storage
            .read_object(bucket_resource.to_string(), object_name.to_string())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.to_lowercase().contains("not found") || msg.contains("404") {
                    Ok(false)
                } else {
                    Err(msg)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeGcsClient {
        objects: Mutex<std::collections::HashMap<String, Vec<u8>>>,
    }

    impl Default for FakeGcsClient {
        fn default() -> Self {
            Self { objects: Mutex::new(std::collections::HashMap::new()) }
        }
    }

    #[async_trait]
    impl GcsClient for FakeGcsClient {
        async fn put_object(&self, _bucket_resource: &str, object_name: &str, _content_type: &str, data: Vec<u8>) -> Result<(), String> {
            self.objects.lock().unwrap().insert(object_name.to_string(), data);
            Ok(())
        }

        async fn get_object(&self, _bucket_resource: &str, object_name: &str) -> Result<Vec<u8>, String> {
            self.objects
                .lock()
                .unwrap()
                .get(object_name)
                .cloned()
                .ok_or_else(|| "object not found (404)".to_string())
        }

        async fn delete_object(&self, _bucket_resource: &str, object_name: &str) -> Result<(), String> {
            self.objects.lock().unwrap().remove(object_name);
            Ok(())
        }

        async fn sign_get_url(&self, bucket_resource: &str, object_name: &str, ttl: Duration) -> Result<String, String> {
            Ok(format!("https://signed.example/{bucket_resource}/{object_name}?ttl={}", ttl.as_secs()))
        }

        async fn object_exists(&self, _bucket_resource: &str, object_name: &str) -> Result<bool, String> {
            Ok(self.objects.lock().unwrap().contains_key(object_name))
        }
    }

    #[tokio::test]
    async fn upload_then_download_round_trips_bytes() {
        let fake = Arc::new(FakeGcsClient::default());
        let store = GcsBlobStore::with_client(fake, "media-bucket".to_string());

        let body = futures::stream::once(async { Ok(Bytes::from_static(b"hello")) });
        store.upload("uploads/a/b.jpg", "image/jpeg", Box::pin(body)).await.unwrap();

        let mut downloaded = store.download("uploads/a/b.jpg").await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = downloaded.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn download_missing_key_maps_to_not_found() {
        let fake = Arc::new(FakeGcsClient::default());
        let store = GcsBlobStore::with_client(fake, "media-bucket".to_string());

        let err = store.download("nope").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_object_and_exists_reflects_it() {
        let fake = Arc::new(FakeGcsClient::default());
        let store = GcsBlobStore::with_client(fake, "media-bucket".to_string());

        let body = futures::stream::once(async { Ok(Bytes::from_static(b"x")) });
        store.upload("k", "image/jpeg", Box::pin(body)).await.unwrap();
        assert!(store.exists("k").await.unwrap());

        store.delete("k").await.unwrap();
        assert!(!store.exists("k").await.unwrap());
    }
}
