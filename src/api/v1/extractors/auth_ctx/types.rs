/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - トークン検証は middleware/services 側の責務
 * - リクエストごとに生成され、リクエストと一緒に破棄される (共有・永続化しない)
 */
use crate::services::auth::Claims;

/// Raw bearer credential as presented by the client.
///
/// Kept for session revocation (logout). Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `claims` は検証済みトークンから一度だけデコードした値
/// - `access_token` はログアウト (セッション失効) 用
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: Claims,
    pub access_token: AccessToken,
}

impl AuthCtx {
    pub fn new(claims: Claims, access_token: AccessToken) -> Self {
        Self {
            claims,
            access_token,
        }
    }

    /// Case-sensitive scope match.
    pub fn has_scope(&self, required: &str) -> bool {
        self.claims.scope() == Some(required)
    }
}
