use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::modules::media::application::ports::incoming::QuotaAccountantPort;
use crate::modules::media::application::ports::outgoing::metadata_store::{FileStore, StorageStatStore};
use crate::modules::media::application::services::resilience::ResilienceWrapper;
use crate::modules::media::domain::entities::{CategoryUsage, FileCategory, StorageStat, UserId};
use crate::modules::media::domain::errors::MediaError;
use crate::modules::media::domain::policies::config::MediaServiceConfig;

/// Cached-then-recompute quota accounting: the live aggregate over
/// non-deleted files is always the quota-enforcement authority; the
/// snapshot is an advisory read-path cache with a staleness TTL.
pub struct QuotaAccountant<F, S>
where
    F: FileStore,
    S: StorageStatStore,
{
    files: Arc<F>,
    stats: Arc<S>,
    config: Arc<MediaServiceConfig>,
    resilience: Arc<ResilienceWrapper>,
}

impl<F, S> QuotaAccountant<F, S>
where
    F: FileStore,
    S: StorageStatStore,
{
    pub fn new(files: Arc<F>, stats: Arc<S>, config: Arc<MediaServiceConfig>, resilience: Arc<ResilienceWrapper>) -> Self {
        Self { files, stats, config, resilience }
    }

    /// Live aggregate over non-deleted Files for `owner`. Used directly by
    /// the ingest quota guard so stale snapshots never admit an
    /// over-quota upload.
    pub async fn live_usage(&self, owner: UserId) -> Result<u64, MediaError> {
        let rows = self
            .resilience
            .call(|| self.files.aggregate_usage_for_owner(owner))
            .await?;
        Ok(rows.iter().map(|(_, bytes, _)| *bytes).sum())
    }

    async fn recompute_snapshot(&self, owner: UserId) -> Result<StorageStat, MediaError> {
        let rows = self
            .resilience
            .call(|| self.files.aggregate_usage_for_owner(owner))
            .await?;

        let mut stat = StorageStat {
            user_id: owner,
            total_bytes: 0,
            total_files: 0,
            image: CategoryUsage::default(),
            video: CategoryUsage::default(),
            audio: CategoryUsage::default(),
            document: CategoryUsage::default(),
            other: CategoryUsage::default(),
            storage_quota_bytes: self.config.default_quota_bytes,
            storage_used_percentage: 0.0,
            last_calculated_at: Utc::now(),
        };

        for (category, bytes, count) in rows {
            stat.total_bytes += bytes;
            stat.total_files += count;
            let usage = match category {
                FileCategory::Image => &mut stat.image,
                FileCategory::Video => &mut stat.video,
                FileCategory::Audio => &mut stat.audio,
                FileCategory::Document => &mut stat.document,
                FileCategory::Other => &mut stat.other,
            };
            usage.bytes += bytes;
            usage.count += count;
        }

        stat.storage_used_percentage = if stat.storage_quota_bytes == 0 {
            0.0
        } else {
            100.0 * stat.total_bytes as f64 / stat.storage_quota_bytes as f64
        };

        self.resilience.call(|| self.stats.upsert(&stat)).await?;

        Ok(stat)
    }
}

#[async_trait]
impl<F, S> QuotaAccountantPort for QuotaAccountant<F, S>
where
    F: FileStore,
    S: StorageStatStore,
{
    async fn get_stats(&self, owner: UserId) -> Result<StorageStat, MediaError> {
        let cached = self.resilience.call(|| self.stats.get(owner)).await?;

        match cached {
            Some(stat)
                if Utc::now().signed_duration_since(stat.last_calculated_at).to_std().unwrap_or_default()
                    < self.config.storage_stat_ttl =>
            {
                Ok(stat)
            }
            _ => self.recompute_snapshot(owner).await,
        }
    }

    async fn check_quota(&self, owner: UserId, additional_bytes: u64) -> Result<(), MediaError> {
        let used = self.live_usage(owner).await?;
        let quota = self.config.default_quota_bytes;
        if used + additional_bytes > quota {
            return Err(MediaError::QuotaExceeded);
        }
        Ok(())
    }

    async fn invalidate(&self, owner: UserId) -> Result<(), MediaError> {
        self.recompute_snapshot(owner).await.map(|_| ())
    }
}
