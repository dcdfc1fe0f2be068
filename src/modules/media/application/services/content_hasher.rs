use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use sha2::{Digest, Sha256};

use crate::modules::media::domain::errors::MediaError;

/// Streaming tee-hash: reads the upload exactly once,
/// copying bytes into a bounded in-memory buffer while feeding a SHA-256
/// sponge, so the same pass yields both a digest and replayable bytes for
/// the subsequent blob upload.
pub struct ContentHasher {
    max_buffered_bytes: u64,
}

pub struct HashedUpload {
    pub hex_digest: String,
    pub buffered_bytes: Bytes,
    pub size_bytes: u64,
}

impl ContentHasher {
    pub fn new(max_buffered_bytes: u64) -> Self {
        Self { max_buffered_bytes }
    }

    pub async fn hash_stream(
        &self,
        mut stream: BoxStream<'static, Result<Bytes, std::io::Error>>,
    ) -> Result<HashedUpload, MediaError> {
        let mut hasher = Sha256::new();
        let mut buf = BytesMut::new();
        let mut total: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediaError::IoError(e.to_string()))?;
            total += chunk.len() as u64;
            if total > self.max_buffered_bytes {
                return Err(MediaError::FileTooLarge);
            }
            hasher.update(&chunk);
            buf.extend_from_slice(&chunk);
        }

        let hex_digest = hex::encode(hasher.finalize());
        Ok(HashedUpload {
            hex_digest,
            buffered_bytes: buf.freeze(),
            size_bytes: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn stream_of(chunks: Vec<&'static [u8]>) -> BoxStream<'static, Result<Bytes, std::io::Error>> {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c)))).boxed()
    }

    #[tokio::test]
    async fn hashes_match_sha256_reference() {
        let hasher = ContentHasher::new(1024);
        let result = hasher
            .hash_stream(stream_of(vec![b"hello ", b"world"]))
            .await
            .unwrap();

        let mut reference = Sha256::new();
        reference.update(b"hello world");
        assert_eq!(result.hex_digest, hex::encode(reference.finalize()));
        assert_eq!(result.size_bytes, 11);
        assert_eq!(&result.buffered_bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn rejects_stream_exceeding_buffer_cap() {
        let hasher = ContentHasher::new(4);
        let result = hasher.hash_stream(stream_of(vec![b"too many bytes"])).await;
        assert!(matches!(result, Err(MediaError::FileTooLarge)));
    }
}
