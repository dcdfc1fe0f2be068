use crate::modules::media::domain::entities::UploadContext;
use crate::modules::media::domain::errors::MediaError;

use super::config::MediaServiceConfig;

/// Validates an incoming upload before a single byte reaches the blob
/// store: reject early, cheaply, before any I/O is attempted.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_image_types: Vec<&'static str>,
    allowed_video_types: Vec<&'static str>,
    allowed_audio_types: Vec<&'static str>,
    allowed_document_types: Vec<&'static str>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_image_types: vec![
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/heic",
            ],
            allowed_video_types: vec!["video/mp4", "video/quicktime", "video/webm"],
            allowed_audio_types: vec!["audio/mpeg", "audio/mp4", "audio/ogg", "audio/wav"],
            allowed_document_types: vec![
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ],
        }
    }
}

impl UploadPolicy {
    /// Overall size cap, tighter for profile photos, plus a content-type
    /// allowlist.
    pub fn validate(
        &self,
        config: &MediaServiceConfig,
        context: UploadContext,
        mime_type: &str,
        declared_size_bytes: u64,
    ) -> Result<(), MediaError> {
        let max_size = match context {
            UploadContext::ProfilePhoto => config.max_profile_photo_size_bytes,
            UploadContext::UserUpload | UploadContext::MessageMedia => config.max_file_size_bytes,
        };
        if declared_size_bytes > max_size {
            return Err(MediaError::FileTooLarge);
        }

        if context == UploadContext::ProfilePhoto && !self.allowed_image_types.contains(&mime_type)
        {
            return Err(MediaError::InvalidContentType(mime_type.to_string()));
        }

        if !self.is_allowed_mime_type(mime_type) {
            return Err(MediaError::InvalidContentType(mime_type.to_string()));
        }

        Ok(())
    }

    fn is_allowed_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_image_types.contains(&mime_type)
            || self.allowed_video_types.contains(&mime_type)
            || self.allowed_audio_types.contains(&mime_type)
            || self.allowed_document_types.contains(&mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_profile_photo() {
        let policy = UploadPolicy::default();
        let config = MediaServiceConfig::for_tests();
        let result = policy.validate(
            &config,
            UploadContext::ProfilePhoto,
            "image/jpeg",
            config.max_profile_photo_size_bytes + 1,
        );
        assert!(matches!(result, Err(MediaError::FileTooLarge)));
    }

    #[test]
    fn rejects_unknown_mime_type() {
        let policy = UploadPolicy::default();
        let config = MediaServiceConfig::for_tests();
        let result =
            policy.validate(&config, UploadContext::UserUpload, "application/x-msdownload", 10);
        assert!(matches!(result, Err(MediaError::InvalidContentType(_))));
    }

    #[test]
    fn accepts_valid_image_within_limits() {
        let policy = UploadPolicy::default();
        let config = MediaServiceConfig::for_tests();
        let result = policy.validate(&config, UploadContext::UserUpload, "image/png", 1024);
        assert!(result.is_ok());
    }
}
