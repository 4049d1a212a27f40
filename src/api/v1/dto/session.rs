/*
 * Responsibility
 * - 認証済みセッション (/me) の response DTO
 */
use serde::Serialize;

use crate::services::auth::Claims;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<i64>,
    pub issued_at: Option<i64>,
}

impl From<&Claims> for MeResponse {
    fn from(claims: &Claims) -> Self {
        Self {
            subject: claims.subject.clone(),
            scope: claims.scope.clone(),
            expires_at: claims.expiry,
            issued_at: claims.issued_at,
        }
    }
}
