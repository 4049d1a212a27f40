/*
 * Responsibility
 * - admin scope 専用の疎通確認
 */
use axum::Json;
use serde_json::{Value, json};

use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn ping(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "subject": ctx.claims.subject(),
    }))
}
