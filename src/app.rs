/*
 * Responsibility
 * - Config読み込み → tracing 初期化 → 依存生成 → Router 組み立て
 * - Middleware の適用 (http / security_headers / client_ip、ルートごとの auth・rate limit は routes 側)
 * - axum::serve() で起動
 */
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing_subscriber::EnvFilter;

use crate::{
    api,
    config::{AppEnv, Config},
    middleware,
    services::cache::{CacheClient, ValkeyClient},
    state::AppState,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.app_env);

    let cache = Arc::new(ValkeyClient::new(&config.redis_url).await?);
    tracing::info!(backend = cache.backend_name(), "cache connected");

    let state = AppState::from_config(&config, cache);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, rate_limit = ?config.rate_limit, "listening");

    // ConnectInfo is what client_ip falls back to when proxy headers are not trusted
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn init_tracing(app_env: AppEnv) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!app_env.is_production())
        .init();
}

pub fn build_router(state: AppState) -> Router {
    let trust_proxy_headers = state.trust_proxy_headers;

    let app = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let app = middleware::client_ip::apply(app, trust_proxy_headers);
    let app = middleware::security_headers::apply(app);
    middleware::http::apply(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::services::cache::memory::MemoryCache;
    use crate::test_support::{body_json, mint, now, state_with, user_claims};

    fn request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "198.51.100.20");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_router(state_with(&MemoryCache::new()));

        let response = app
            .oneshot(request(Method::GET, "/api/v1/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-ratelimit-limit").is_none());
    }

    #[tokio::test]
    async fn security_headers_cover_public_and_rejected_responses() {
        let app = build_router(state_with(&MemoryCache::new()));

        let public = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/health", None))
            .await
            .unwrap();
        let rejected = app
            .oneshot(request(Method::GET, "/api/v1/me", None))
            .await
            .unwrap();

        for response in [public, rejected] {
            assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
            assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        }
    }

    #[tokio::test]
    async fn me_requires_authentication() {
        let app = build_router(state_with(&MemoryCache::new()));

        let response = app
            .oneshot(request(Method::GET, "/api/v1/me", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["status"], 401);
        assert_eq!(json["error"]["code"], "INVALID_AUTHORIZATION_HEADER");
    }

    #[tokio::test]
    async fn me_returns_claims_and_quota_headers() {
        let cache = MemoryCache::new();
        let iat = now();
        cache.insert(
            "access_token:cred-1",
            mint(&json!({"sub": "u-42", "scope": "user", "iat": iat, "exp": iat + 600})),
        );
        let app = build_router(state_with(&cache));

        let response = app
            .oneshot(request(Method::GET, "/api/v1/me", Some("cred-1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "4");

        let json = body_json(response).await;
        assert_eq!(json["subject"], "u-42");
        assert_eq!(json["scope"], "user");
        assert_eq!(json["expires_at"], iat + 600);

        // keyed on the full path and the forwarded client address
        assert_eq!(
            cache.increments()[0].0,
            "rate_limit:/api/v1/me:198.51.100.20"
        );
    }

    #[tokio::test]
    async fn rejected_requests_are_not_counted() {
        let cache = MemoryCache::new();
        cache.insert("access_token:cred-1", mint(&user_claims("admin")));
        let app = build_router(state_with(&cache));

        let unauthenticated = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/me", Some("nope")))
            .await
            .unwrap();
        let forbidden = app
            .oneshot(request(Method::GET, "/api/v1/me", Some("cred-1")))
            .await
            .unwrap();

        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert!(cache.increments().is_empty());
    }

    #[tokio::test]
    async fn admin_route_requires_admin_scope() {
        let cache = MemoryCache::new();
        cache.insert("access_token:user-cred", mint(&user_claims("user")));
        cache.insert("access_token:admin-cred", mint(&user_claims("admin")));
        let app = build_router(state_with(&cache));

        let as_user = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/admin/ping", Some("user-cred")))
            .await
            .unwrap();
        assert_eq!(as_user.status(), StatusCode::FORBIDDEN);
        assert!(
            body_json(as_user).await["error"]["message"]
                .as_str()
                .unwrap()
                .contains("admin")
        );

        let as_admin = app
            .oneshot(request(Method::GET, "/api/v1/admin/ping", Some("admin-cred")))
            .await
            .unwrap();
        assert_eq!(as_admin.status(), StatusCode::OK);
        // admin group is not rate limited
        assert!(as_admin.headers().get("x-ratelimit-limit").is_none());
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let cache = MemoryCache::new();
        cache.insert("access_token:cred-1", mint(&user_claims("user")));
        let app = build_router(state_with(&cache));

        let logout = app
            .clone()
            .oneshot(request(Method::POST, "/api/v1/auth/logout", Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);
        assert!(!cache.contains("access_token:cred-1"));

        let after = app
            .oneshot(request(Method::GET, "/api/v1/me", Some("cred-1")))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(after).await["error"]["code"], "INVALID_ACCESS_TOKEN");
    }

    #[tokio::test]
    async fn user_group_is_rate_limited() {
        let cache = MemoryCache::new();
        cache.insert("access_token:cred-1", mint(&user_claims("user")));
        let app = build_router(state_with(&cache));

        let mut last = None;
        for _ in 0..6 {
            last = Some(
                app.clone()
                    .oneshot(request(Method::GET, "/api/v1/me", Some("cred-1")))
                    .await
                    .unwrap(),
            );
        }

        let last = last.unwrap();
        assert_eq!(last.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(last.headers()["x-ratelimit-remaining"], "-1");
        assert!(last.headers().contains_key(header::RETRY_AFTER));
    }
}
