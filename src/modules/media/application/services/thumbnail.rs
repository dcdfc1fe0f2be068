use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use fast_image_resize::{images::Image as FrImage, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use futures::stream::{self, BoxStream, StreamExt};
use image::{ImageFormat, ImageReader};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::modules::media::application::ports::incoming::ThumbnailPipelinePort;
use crate::modules::media::application::ports::outgoing::blob_store::BlobStore;
use crate::modules::media::application::ports::outgoing::metadata_store::FileStore;
use crate::modules::media::application::ports::outgoing::thumbnail_job_queue::{
    ThumbnailFailureReason, ThumbnailJobQueue,
};
use crate::modules::media::application::services::resilience::ResilienceWrapper;
use crate::modules::media::application::services::storage_key::StorageKeyDeriver;
use crate::modules::media::domain::entities::{File, FileCategory, ProcessingStatus};
use crate::modules::media::domain::errors::MediaError;
use crate::modules::media::domain::policies::config::MediaServiceConfig;

/// Sizes the pipeline derives for every image file: decode, resize,
/// encode, upload, using `fast_image_resize` + `image` + `rayon`.
#[derive(Debug, Clone, Copy)]
struct ThumbnailSpec {
    label: &'static str,
    max_dimension_px: u32,
}

fn configured_sizes(config: &MediaServiceConfig) -> [ThumbnailSpec; 3] {
    [
        ThumbnailSpec { label: "small", max_dimension_px: config.thumbnail_small_px },
        ThumbnailSpec { label: "medium", max_dimension_px: config.thumbnail_medium_px },
        ThumbnailSpec { label: "large", max_dimension_px: config.thumbnail_large_px },
    ]
}

pub struct ThumbnailPipeline<Fs, B, Q>
where
    Fs: FileStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
{
    files: Arc<Fs>,
    blobs: Arc<B>,
    queue: Arc<Q>,
    config: Arc<MediaServiceConfig>,
    resilience: Arc<ResilienceWrapper>,
}

impl<Fs, B, Q> ThumbnailPipeline<Fs, B, Q>
where
    Fs: FileStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
{
    pub fn new(
        files: Arc<Fs>,
        blobs: Arc<B>,
        queue: Arc<Q>,
        config: Arc<MediaServiceConfig>,
        resilience: Arc<ResilienceWrapper>,
    ) -> Self {
        Self { files, blobs, queue, config, resilience }
    }

    async fn process(&self, file_id: Uuid) -> Result<(), MediaError> {
        let mut file = self
            .resilience
            .call(|| self.files.find_by_id(file_id))
            .await?
            .ok_or(MediaError::FileNotFound)?;

        if file.category != FileCategory::Image {
            file.processing_status = ProcessingStatus::Completed;
            return self.save(&mut file).await;
        }

        // 1. pending -> processing.
        file.processing_status = ProcessingStatus::Processing;
        self.save(&mut file).await?;

        // 2. Download canonical blob.
        let source_bytes = match self.download_source(&file).await {
            Ok(bytes) => bytes,
            Err(reason) => return self.fail(&mut file, reason).await,
        };

        // 3. Decode.
        let decoded = match ImageReader::new(Cursor::new(&source_bytes[..]))
            .with_guessed_format()
            .map_err(|_| ThumbnailFailureReason::UnsupportedFormat)
            .and_then(|r| r.decode().map_err(|_| ThumbnailFailureReason::CorruptSource))
        {
            Ok(img) => img,
            Err(reason) => return self.fail(&mut file, reason).await,
        };

        let (width, height) = (decoded.width(), decoded.height());
        file.width = Some(width);
        file.height = Some(height);
        // 4. aspect ratio "w.ww:1".
        file.aspect_ratio = Some(format!("{:.2}:1", width as f64 / height.max(1) as f64));

        // 5. Per-size best-effort variants.
        for spec in configured_sizes(&self.config) {
            match self.make_variant(&file, &decoded, spec).await {
                Ok(url) => match spec.label {
                    "small" => file.thumbnail_small_url = Some(url),
                    "medium" => file.thumbnail_medium_url = Some(url),
                    _ => file.thumbnail_large_url = Some(url),
                },
                Err(reason) => {
                    warn!(file_id = %file.file_id, size = spec.label, %reason, "thumbnail variant failed, skipping");
                }
            }
        }

        // 6 & 7. Patch metadata, transition to completed.
        file.processing_status = ProcessingStatus::Completed;
        if let Err(e) = self.save(&mut file).await {
            warn!(file_id = %file.file_id, error = %e, "metadata patch failed");
            file.processing_status = ProcessingStatus::Failed;
            file.processing_error = Some("failed to update metadata".to_string());
            let _ = self.save(&mut file).await;
            return Err(e);
        }

        Ok(())
    }

    async fn download_source(&self, file: &File) -> Result<Bytes, ThumbnailFailureReason> {
        let mut stream = self
            .blobs
            .download(&file.storage_key)
            .await
            .map_err(|e| ThumbnailFailureReason::DownloadFailed(e.to_string()))?;

        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ThumbnailFailureReason::DownloadFailed(e.to_string()))?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    async fn make_variant(
        &self,
        file: &File,
        decoded: &image::DynamicImage,
        spec: ThumbnailSpec,
    ) -> Result<String, ThumbnailFailureReason> {
        let (src_w, src_h) = (decoded.width(), decoded.height());
        let scale = (spec.max_dimension_px as f64 / src_w.max(src_h) as f64).min(1.0);
        let (dst_w, dst_h) = (
            ((src_w as f64 * scale).round() as u32).max(1),
            ((src_h as f64 * scale).round() as u32).max(1),
        );

        let src_image = FrImage::from_vec_u8(
            src_w,
            src_h,
            decoded.to_rgba8().into_raw(),
            PixelType::U8x4,
        )
        .map_err(|e| ThumbnailFailureReason::EncodeFailed(e.to_string()))?;

        let mut dst_image = FrImage::new(dst_w, dst_h, PixelType::U8x4);
        let mut resizer = Resizer::new();
        resizer
            .resize(
                &src_image,
                &mut dst_image,
                &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
            )
            .map_err(|e| ThumbnailFailureReason::EncodeFailed(e.to_string()))?;

        let resized = image::RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
            .ok_or_else(|| ThumbnailFailureReason::EncodeFailed("buffer size mismatch".to_string()))?;
        let resized = image::DynamicImage::ImageRgba8(resized);

        let encode_format = match file.mime_type.as_str() {
            "image/png" => ImageFormat::Png,
            "image/jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Jpeg,
        };

        let mut encoded = Vec::new();
        if encode_format == ImageFormat::Jpeg {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut encoded,
                self.config.thumbnail_jpeg_quality,
            );
            encoder
                .encode_image(&resized)
                .map_err(|e| ThumbnailFailureReason::EncodeFailed(e.to_string()))?;
        } else {
            resized
                .write_to(&mut Cursor::new(&mut encoded), encode_format)
                .map_err(|e| ThumbnailFailureReason::EncodeFailed(e.to_string()))?;
        }

        let variant_key = StorageKeyDeriver::derive_thumbnail_key(&file.storage_key, spec.label);
        let content_type = match encode_format {
            ImageFormat::Png => "image/png",
            _ => "image/jpeg",
        };
        let body: BoxStream<'static, Result<Bytes, std::io::Error>> =
            stream::iter(vec![Ok(Bytes::from(encoded))]).boxed();

        self.blobs
            .upload(&variant_key, content_type, body)
            .await
            .map_err(|e| ThumbnailFailureReason::EncodeFailed(e.to_string()))?;

        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.config.upload_bucket, variant_key
        ))
    }

    async fn save(&self, file: &mut File) -> Result<(), MediaError> {
        file.updated_at = chrono::Utc::now();
        self.resilience.call(|| self.files.update(file)).await
    }

    async fn fail(&self, file: &mut File, reason: ThumbnailFailureReason) -> Result<(), MediaError> {
        error!(file_id = %file.file_id, %reason, "thumbnail pipeline failed");
        file.processing_status = ProcessingStatus::Failed;
        file.processing_error = Some(reason.to_string());
        self.save(file).await
    }
}

#[async_trait]
impl<Fs, B, Q> ThumbnailPipelinePort for ThumbnailPipeline<Fs, B, Q>
where
    Fs: FileStore,
    B: BlobStore,
    Q: ThumbnailJobQueue,
{
    async fn process_one(&self, file_id: Uuid) -> Result<(), MediaError> {
        self.process(file_id).await
    }

    async fn run_batch(&self, max: u32) -> Result<u32, MediaError> {
        let jobs = self
            .queue
            .claim_batch(max)
            .await
            .map_err(|e| MediaError::StorageError(e.to_string()))?;

        let mut succeeded = 0u32;
        for job in jobs {
            match self.process(job.file_id).await {
                Ok(()) => {
                    let _ = self.queue.mark_done(job.job_id).await;
                    succeeded += 1;
                }
                Err(e) => {
                    info!(job_id = %job.job_id, error = %e, "thumbnail job failed");
                    let _ = self
                        .queue
                        .mark_failed(job.job_id, ThumbnailFailureReason::EncodeFailed(e.to_string()))
                        .await;
                }
            }
        }
        Ok(succeeded)
    }
}
