use chrono::{DateTime, TimeZone, Utc};
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use crate::services::cache::{CacheClient, CacheError};

/// Result of one counted request.
///
/// `remaining` goes negative once the client is over quota. `reset_at` and
/// `observed_at` both come from the store clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub total: u64,
    pub remaining: i64,
    pub reset_at: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
}

impl WindowCount {
    pub fn is_exceeded(&self) -> bool {
        self.remaining < 0
    }

    /// Whole seconds until the window resets, rounded up. Never negative.
    pub fn retry_after_secs(&self) -> u64 {
        let ms = (self.reset_at - self.observed_at).num_milliseconds().max(0);
        (ms as u64).div_ceil(1000)
    }
}

/// Fixed-window request counter.
///
/// Increment and read happen in one store round trip; two concurrent callers
/// never observe the same total.
pub trait WindowCounter: Send + Sync {
    fn increment_with_window<'a>(
        &'a self,
        key: &'a str,
        max_requests: u64,
        window: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<WindowCount, CounterError>> + Send + 'a>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("store returned invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// `WindowCounter` on top of any `CacheClient`.
#[derive(Clone)]
pub struct CacheWindowCounter<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
}

impl<C: CacheClient> CacheWindowCounter<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            prefix: "rate_limit".to_string(),
        }
    }

    pub fn key(&self, raw: &str) -> String {
        format!("{}:{}", self.prefix, raw)
    }
}

impl<C: CacheClient> WindowCounter for CacheWindowCounter<C> {
    fn increment_with_window<'a>(
        &'a self,
        key: &'a str,
        max_requests: u64,
        window: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<WindowCount, CounterError>> + Send + 'a>> {
        Box::pin(async move {
            let hit = self.cache.incr_window(&self.key(key), window).await?;

            let reset_at = store_time(hit.reset_at_ms)?;
            let observed_at = store_time(hit.now_ms)?;

            let max = i64::try_from(max_requests).unwrap_or(i64::MAX);
            let total = i64::try_from(hit.total).unwrap_or(i64::MAX);

            Ok(WindowCount {
                total: hit.total,
                remaining: max.saturating_sub(total),
                reset_at,
                observed_at,
            })
        })
    }
}

fn store_time(ms: i64) -> Result<DateTime<Utc>, CounterError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(CounterError::InvalidTimestamp(ms))
}
