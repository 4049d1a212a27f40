//! scope による認可
//!
//! - ルート登録時に `ScopeConfig` で必要な scope を決める (リクエストごとには変えない)
//! - access middleware が入れた AuthCtx を読むだけ。検証はしない
//! - 比較は大文字小文字を区別する

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    pub required_scope: String,
}

impl ScopeConfig {
    pub fn new(required_scope: impl Into<String>) -> Self {
        Self {
            required_scope: required_scope.into(),
        }
    }
}

/// Require `config.required_scope` on every route of `router`.
///
/// Must sit inside `access::apply` (layers added later run first).
pub fn apply(router: Router<AppState>, config: ScopeConfig) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        Arc::new(config),
        scope_middleware,
    ))
}

async fn scope_middleware(
    State(config): State<Arc<ScopeConfig>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // AuthCtx が無い = access middleware より外側に組まれている (配線ミス)
    let Some(auth_ctx) = req.extensions().get::<AuthCtx>() else {
        tracing::error!(
            required_scope = %config.required_scope,
            "scope check without AuthCtx; access middleware must run first"
        );
        return Err(AppError::Internal);
    };

    if !auth_ctx.has_scope(&config.required_scope) {
        tracing::warn!(
            required_scope = %config.required_scope,
            granted_scope = ?auth_ctx.claims.scope(),
            subject = ?auth_ctx.claims.subject(),
            "forbidden scope"
        );
        return Err(AppError::forbidden_scope(config.required_scope.clone()));
    }

    Ok(next.run(req).await)
}
