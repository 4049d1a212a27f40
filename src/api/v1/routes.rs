/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証・scope・レート制限をどのルートグループに掛けるかをここで決める
 *
 * Layer order (外側から): access → scope → rate_limit → handler
 * axum は後から .layer したものが外側になるので、apply は内側から順に呼ぶ
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    admin,
    health::health,
    session::{logout, me},
};
use crate::middleware::{
    auth::{ScopeConfig, access, scope},
    rate_limit::{self, RateLimiter},
};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let user = Router::new()
        .route("/me", get(me))
        .route("/auth/logout", post(logout));
    let user = rate_limit::apply(
        user,
        RateLimiter::new(state.window_counter.clone(), state.rate_limit),
    );
    let user = scope::apply(user, ScopeConfig::new("user"));

    let admin = Router::new().route("/admin/ping", get(admin::ping));
    let admin = scope::apply(admin, ScopeConfig::new("admin"));

    let protected = access::apply(user.merge(admin), state);

    Router::new().route("/health", get(health)).merge(protected)
}
