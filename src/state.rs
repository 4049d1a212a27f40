/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: verifier: TokenVerifier, window_counter: WindowCounter, rate_limit など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト固有の値 (AuthCtx, ClientIp) はここに置かない → request extensions
 */
use std::sync::Arc;

use crate::config::{Config, RateLimitConfig};
use crate::services::{
    auth::{TokenVerifier, build_token_verifier},
    cache::CacheClient,
    rate_limit::{CacheWindowCounter, WindowCounter},
};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub window_counter: Arc<dyn WindowCounter>,
    pub rate_limit: RateLimitConfig,
    pub trust_proxy_headers: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.verifier)
            .field("rate_limit", &self.rate_limit)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        verifier: Arc<TokenVerifier>,
        window_counter: Arc<dyn WindowCounter>,
        rate_limit: RateLimitConfig,
        trust_proxy_headers: bool,
    ) -> Self {
        Self {
            verifier,
            window_counter,
            rate_limit,
            trust_proxy_headers,
        }
    }

    /// Wire every store-backed service to the same cache backend.
    pub fn from_config<C: CacheClient>(config: &Config, cache: Arc<C>) -> Self {
        let verifier = build_token_verifier(config, cache.clone());
        let window_counter: Arc<dyn WindowCounter> = Arc::new(CacheWindowCounter::new(cache));

        Self::new(
            verifier,
            window_counter,
            config.rate_limit,
            config.trust_proxy_headers,
        )
    }
}
