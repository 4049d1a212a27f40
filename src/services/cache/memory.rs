//! In-process `CacheClient` for tests.
//!
//! Same window semantics as the Valkey Lua script, plus knobs tests need:
//! a settable clock, a failure switch and a log of committed increments.
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult, WindowHit};

#[derive(Default)]
struct Inner {
    strings: HashMap<String, String>,
    windows: HashMap<String, WindowHit>,
    // (key, total) in the order increments were committed
    increments: Vec<(String, u64)>,
    now_ms: Option<i64>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().strings.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().strings.contains_key(key)
    }

    /// Pin the store clock (unix ms). Without it the wall clock is used.
    pub fn set_now_ms(&self, now_ms: i64) {
        self.lock().now_ms = Some(now_ms);
    }

    /// Every command fails with a connection error while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn increments(&self) -> Vec<(String, u64)> {
        self.lock().increments.clone()
    }

    fn check_available(inner: &Inner) -> CacheResult<()> {
        if inner.unavailable {
            return Err(CacheError::BackendConnection("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        Ok(inner.strings.get(key).cloned())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        Ok(u64::from(inner.strings.remove(key).is_some()))
    }

    async fn incr_window(&self, key: &str, window: Duration) -> CacheResult<WindowHit> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;

        let now_ms = inner
            .now_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let window_ms = (window.as_millis() as i64).max(1);

        let hit = match inner.windows.get(key) {
            Some(hit) if now_ms < hit.reset_at_ms => WindowHit {
                total: hit.total + 1,
                reset_at_ms: hit.reset_at_ms,
                now_ms,
            },
            _ => WindowHit {
                total: 1,
                reset_at_ms: now_ms + window_ms,
                now_ms,
            },
        };

        inner.windows.insert(key.to_string(), hit);
        inner.increments.push((key.to_string(), hit.total));
        Ok(hit)
    }
}
