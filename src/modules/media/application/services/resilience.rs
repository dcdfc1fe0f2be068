use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::modules::media::application::ports::outgoing::metadata_store::StoreError;
use crate::modules::media::domain::errors::MediaError;
use crate::modules::media::domain::policies::config::MediaServiceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerWindow {
    state: BreakerState,
    opened_at: Option<Instant>,
    window_start: Instant,
    requests: u32,
    failures: u32,
    half_open_trials_used: u32,
}

/// Retry with bounded exponential backoff plus a circuit breaker around
/// metadata-store calls, guarding its counters behind a `Mutex` the same
/// way the rest of this codebase protects shared mutable state.
pub struct ResilienceWrapper {
    config: MediaServiceConfig,
    breaker: Mutex<BreakerWindow>,
}

impl ResilienceWrapper {
    pub fn new(config: MediaServiceConfig) -> Self {
        Self {
            config,
            breaker: Mutex::new(BreakerWindow {
                state: BreakerState::Closed,
                opened_at: None,
                window_start: Instant::now(),
                requests: 0,
                failures: 0,
                half_open_trials_used: 0,
            }),
        }
    }

    /// Runs `op`, retrying transient `StoreError`s with exponential
    /// backoff, and failing fast with `ServiceUnavailable` while the
    /// breaker is open.
    pub async fn call<T, Fut, Op>(&self, mut op: Op) -> Result<T, MediaError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if !self.allow_request() {
            return Err(MediaError::ServiceUnavailable);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    self.record_result(true);
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.config.retry_max_attempts => {
                    self.record_result(false);
                    let backoff = self.backoff_for_attempt(attempt);
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    self.record_result(false);
                    return Err(map_store_error(err));
                }
            }
        }
    }

    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.config.retry_base_backoff.as_millis() as u64 * 2u64.pow(attempt.saturating_sub(1));
        Duration::from_millis(millis).min(self.config.retry_max_backoff)
    }

    fn allow_request(&self) -> bool {
        let mut breaker = self.breaker.lock().unwrap();
        match breaker.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                if breaker.opened_at.map(|t| t.elapsed()).unwrap_or_default()
                    >= self.config.circuit_breaker_open_duration
                {
                    breaker.state = BreakerState::HalfOpen;
                    breaker.half_open_trials_used = 0;
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if breaker.half_open_trials_used < self.config.circuit_breaker_half_open_trials {
                    breaker.half_open_trials_used += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_result(&self, success: bool) {
        let mut breaker = self.breaker.lock().unwrap();

        if breaker.state == BreakerState::HalfOpen {
            if success {
                *breaker = BreakerWindow {
                    state: BreakerState::Closed,
                    opened_at: None,
                    window_start: Instant::now(),
                    requests: 0,
                    failures: 0,
                    half_open_trials_used: 0,
                };
            } else {
                breaker.state = BreakerState::Open;
                breaker.opened_at = Some(Instant::now());
            }
            return;
        }

        if breaker.window_start.elapsed() >= self.config.circuit_breaker_window {
            breaker.window_start = Instant::now();
            breaker.requests = 0;
            breaker.failures = 0;
        }

        breaker.requests += 1;
        if !success {
            breaker.failures += 1;
        }

        if breaker.requests >= self.config.circuit_breaker_min_requests
            && breaker.failures as f64 / breaker.requests as f64 >= self.config.circuit_breaker_failure_ratio
        {
            breaker.state = BreakerState::Open;
            breaker.opened_at = Some(Instant::now());
        }
    }
}

fn map_store_error(err: StoreError) -> MediaError {
    match err {
        StoreError::NotFound => MediaError::FileNotFound,
        StoreError::Conflict(msg) => MediaError::PersistenceError(msg),
        StoreError::Database(msg) => MediaError::DatabaseError(msg),
        StoreError::Timeout => MediaError::Timeout,
        StoreError::Unavailable(msg) => MediaError::StorageError(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> MediaServiceConfig {
        let mut config = MediaServiceConfig::for_tests();
        config.retry_max_attempts = 3;
        config.retry_base_backoff = Duration::from_millis(1);
        config.retry_max_backoff = Duration::from_millis(2);
        config.circuit_breaker_min_requests = 2;
        config.circuit_breaker_failure_ratio = 0.5;
        config.circuit_breaker_open_duration = Duration::from_millis(20);
        config
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let wrapper = ResilienceWrapper::new(fast_config());
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result = wrapper
            .call(|| {
                let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(StoreError::Timeout)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_logical_failures() {
        let wrapper = ResilienceWrapper::new(fast_config());
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result: Result<(), MediaError> = wrapper
            .call(|| {
                attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async { Err(StoreError::NotFound) }
            })
            .await;

        assert!(matches!(result, Err(MediaError::FileNotFound)));
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn opens_breaker_after_failure_ratio_exceeded() {
        let wrapper = ResilienceWrapper::new(fast_config());

        for _ in 0..2 {
            let _: Result<(), MediaError> = wrapper
                .call(|| async { Err(StoreError::Unavailable("down".into())) })
                .await;
        }

        let result: Result<(), MediaError> = wrapper.call(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(MediaError::ServiceUnavailable)));
    }
}
