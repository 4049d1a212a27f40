//! access token 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <credential>` を厳密にパースする (値は 1 つだけ、スペース区切りで 2 要素)
//! - credential を TokenVerifier に渡し、検証済み Claims を取り出す
//! - 失敗理由 (not found / signature / alg / store down) はログにだけ残し、外には同じ 401 を返す

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::{AccessToken, AuthCtx};
use crate::error::AppError;
use crate::services::auth::TokenError;
use crate::state::AppState;

/// 保護したいルートに認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let credential = bearer_credential(req.headers())?.to_string();

    let claims = match state.verifier.verify(&credential).await {
        Ok(claims) => claims,
        Err(TokenError::StoreUnavailable(err)) => {
            tracing::error!(error = %err, "token store unavailable");
            return Err(AppError::InvalidAccessToken);
        }
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::InvalidAccessToken);
        }
    };

    let auth_ctx = AuthCtx::new(claims, AccessToken::new(credential));

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// Extract `<credential>` from exactly one `Authorization: Bearer <credential>`.
fn bearer_credential(headers: &HeaderMap) -> Result<&str, AppError> {
    let mut values = headers.get_all(header::AUTHORIZATION).iter();

    let value = values.next().ok_or(AppError::InvalidAuthorizationHeader)?;
    if values.next().is_some() {
        return Err(AppError::InvalidAuthorizationHeader);
    }

    let value = value
        .to_str()
        .map_err(|_| AppError::InvalidAuthorizationHeader)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(credential), None) if !credential.is_empty() => Ok(credential),
        _ => Err(AppError::InvalidAuthorizationHeader),
    }
}
