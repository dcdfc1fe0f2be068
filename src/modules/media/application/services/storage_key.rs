use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::modules::media::domain::entities::UploadContext;

/// Deterministic key generator:
/// `{context}/{user_id}/{yyyy}/{mm}/{dd}/{content_hash}{ext}`. Keys are
/// lowercase and path-safe; the content hash rules out collisions.
pub struct StorageKeyDeriver;

impl StorageKeyDeriver {
    pub fn derive(
        context: UploadContext,
        uploader_user_id: Uuid,
        content_hash: &str,
        extension: &str,
        now: DateTime<Utc>,
    ) -> String {
        let ext = Self::sanitize_extension(extension);
        format!(
            "{}/{}/{:04}/{:02}/{:02}/{}{}",
            context.as_str(),
            uploader_user_id,
            now.format("%Y").to_string().parse::<u32>().unwrap_or(0),
            now.format("%m").to_string().parse::<u32>().unwrap_or(0),
            now.format("%d").to_string().parse::<u32>().unwrap_or(0),
            content_hash.to_lowercase(),
            ext,
        )
    }

    /// Derives a sibling key for a thumbnail variant under a `thumbnails/`
    /// prefix.
    pub fn derive_thumbnail_key(source_key: &str, size_label: &str) -> String {
        format!("thumbnails/{source_key}/{size_label}")
    }

    fn sanitize_extension(extension: &str) -> String {
        let trimmed = extension.trim_start_matches('.').to_lowercase();
        let safe: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if safe.is_empty() {
            String::new()
        } else {
            format!(".{safe}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn derives_slash_layout_key() {
        let user_id = Uuid::nil();
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let key = StorageKeyDeriver::derive(
            UploadContext::UserUpload,
            user_id,
            "ABCDEF",
            ".JPG",
            now,
        );
        assert_eq!(
            key,
            format!("uploads/{user_id}/2026/03/07/abcdef.jpg")
        );
    }

    #[test]
    fn thumbnail_key_is_a_sibling_under_prefix() {
        let key = StorageKeyDeriver::derive_thumbnail_key("uploads/u/2026/03/07/abc.jpg", "small");
        assert_eq!(key, "thumbnails/uploads/u/2026/03/07/abc.jpg/small");
    }
}
