/*
 * Responsibility
 * - middleware の公開インターフェース
 * - リクエストの流れ: http → security_headers → client_ip → auth::access → auth::scope → rate_limit → handler
 */
pub mod auth;
pub mod client_ip;
pub mod http;
pub mod rate_limit;
pub mod security_headers;
