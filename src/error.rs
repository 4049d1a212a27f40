/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - 認証・認可・レート制限の失敗を統一的にレスポンスへ変換
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid authorization header")]
    InvalidAuthorizationHeader,
    // not found / bad signature / wrong alg / store down: one code on purpose
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("forbidden: requires scope {required}")]
    ForbiddenScope { required: String },
    #[error("rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("request timeout")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn forbidden_scope(required: impl Into<String>) -> Self {
        Self::ForbiddenScope {
            required: required.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidAuthorizationHeader => (
                StatusCode::UNAUTHORIZED,
                "INVALID_AUTHORIZATION_HEADER",
                "authorization header must be 'Bearer <token>'".to_string(),
            ),
            AppError::InvalidAccessToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_ACCESS_TOKEN",
                "access token is invalid or expired".to_string(),
            ),
            AppError::ForbiddenScope { required } => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN_SCOPE",
                format!("token does not grant the required scope '{required}'"),
            ),
            AppError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                format!("rate limit exceeded, retry after {retry_after}s"),
            ),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
                "request timeout".to_string(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}
