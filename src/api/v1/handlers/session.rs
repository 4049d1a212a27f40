/*
 * Responsibility
 * - 認証済みユーザー自身のセッションを扱う handler (/me, /auth/logout)
 * - AuthCtx は middleware が入れたものを extractor で受け取るだけ
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{dto::session::MeResponse, extractors::AuthCtxExtractor},
    error::AppError,
    state::AppState,
};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(&ctx.claims))
}

/// Revoke the presented session: the token record is deleted from the store,
/// so the same credential fails authentication from now on.
pub async fn logout(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<StatusCode, AppError> {
    let removed = state
        .verifier
        .store()
        .revoke(ctx.access_token.as_str())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "token revocation failed");
            AppError::Internal
        })?;

    // already gone (raced with expiry or another logout) is still a success
    tracing::info!(subject = ?ctx.claims.subject(), removed, "session revoked");
    Ok(StatusCode::NO_CONTENT)
}
