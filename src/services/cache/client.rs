//! Cache client interface used by higher-level services (token lookup, rate limits).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command/serialization).
///
/// Note:
/// - We keep this independent from `AppError` so callers can decide how to fail
///   (401 for token lookup, 500 for rate limiting).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
    #[error("cache value error: {0}")]
    InvalidValue(String),
}

/// Counter state returned by a single fixed-window increment.
///
/// `reset_at_ms` is the absolute end of the window (unix epoch, milliseconds)
/// as recorded by the store when the window was opened; `now_ms` is the store
/// clock at the time of this increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub total: u64,
    pub reset_at_ms: i64,
    pub now_ms: i64,
}

/// A minimal cache interface.
///
/// - Token lookup only needs `GET` (and `DEL` for revocation).
/// - Rate limiting needs one atomic "increment within window" round trip.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside)
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Delete a key. Returns number of deleted keys.
    async fn del(&self, key: &str) -> CacheResult<u64>;

    // Increment the counter stored under `key` and return the post-increment
    // total together with the window's reset time, in one atomic step.
    //
    // - A missing or elapsed window is replaced by a fresh one ending at
    //   `now + window` (store clock).
    // - A request at exactly `reset_at_ms` already belongs to the next window.
    async fn incr_window(&self, key: &str, window: Duration) -> CacheResult<WindowHit>;
}
