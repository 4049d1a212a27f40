//! Fixed-window rate limiting per (route, client ip).
//!
//! Responsibility:
//! - Count every request in the shared store (one atomic round trip)
//! - Always report quota via `X-RateLimit-*` response headers
//! - Reject over-quota requests with 429 + `Retry-After`
//!
//! Policy:
//! - Fail closed: if the store cannot count the request, answer 500 instead
//!   of letting it through uncounted.
//! - No local caching of counters; the store is the only source of truth.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::middleware::client_ip::ClientIp;
use crate::services::rate_limit::{WindowCount, WindowCounter};
use crate::state::AppState;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Clone)]
pub struct RateLimiter {
    counter: Arc<dyn WindowCounter>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(counter: Arc<dyn WindowCounter>, config: RateLimitConfig) -> Self {
        Self { counter, config }
    }
}

/// Rate-limit every route of `router` with its own `RateLimitConfig`.
pub fn apply(router: Router<AppState>, limiter: RateLimiter) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(key) = limiter_key(&req) else {
        tracing::error!("ClientIp missing; client_ip middleware must run first");
        return AppError::Internal.into_response();
    };

    let count = match limiter
        .counter
        .increment_with_window(&key, limiter.config.max_requests, limiter.config.window)
        .await
    {
        Ok(count) => count,
        Err(err) => {
            tracing::error!(error = %err, key = %key, "rate limit store unavailable");
            return AppError::Internal.into_response();
        }
    };

    let mut response = if count.is_exceeded() {
        let retry_after = count.retry_after_secs();
        tracing::warn!(key = %key, total = count.total, retry_after, "rate limit exceeded");
        AppError::RateLimited { retry_after }.into_response()
    } else {
        next.run(req).await
    };

    set_quota_headers(response.headers_mut(), limiter.config.max_requests, &count);
    response
}

/// `<path>:<client ip>`; `None` when the client ip stage did not run.
fn limiter_key(req: &Request<Body>) -> Option<String> {
    let client_ip = req.extensions().get::<ClientIp>()?;

    // nest() strips the prefix from req.uri(); key on the full path
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| req.uri().path());

    let ip = client_ip
        .ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Some(format!("{path}:{ip}"))
}

fn set_quota_headers(headers: &mut HeaderMap, limit: u64, count: &WindowCount) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(count.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(count.reset_at.timestamp()));
}
