//! Shared helpers for unit tests: token minting, in-memory state, body parsing.
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::config::RateLimitConfig;
use crate::services::auth::{CacheTokenStore, TokenVerifier};
use crate::services::cache::memory::MemoryCache;
use crate::services::rate_limit::{CacheWindowCounter, WindowCounter};
use crate::state::AppState;

pub const SECRET: &[u8] = b"unit-test-hmac-secret";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn mint_with(alg: Algorithm, secret: &[u8], claims: &Value) -> String {
    jsonwebtoken::encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret)).unwrap()
}

pub fn mint(claims: &Value) -> String {
    mint_with(Algorithm::HS256, SECRET, claims)
}

pub fn user_claims(scope: &str) -> Value {
    let iat = now();
    json!({"sub": "u-1", "scope": scope, "iat": iat, "exp": iat + 3600})
}

/// State wired to `cache`: 5 requests per minute, proxy headers trusted.
pub fn state_with(cache: &MemoryCache) -> AppState {
    let cache = Arc::new(cache.clone());
    let store = CacheTokenStore::new(cache.clone(), "access_token");
    let verifier = Arc::new(TokenVerifier::new(SECRET, 0, Arc::new(store)));
    let window_counter: Arc<dyn WindowCounter> = Arc::new(CacheWindowCounter::new(cache));

    AppState::new(
        verifier,
        window_counter,
        RateLimitConfig::new(5, Duration::from_secs(60)),
        true,
    )
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
