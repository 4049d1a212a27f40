/// Factory: build the auth services from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{CacheTokenStore, TokenStore, TokenVerifier};
use crate::services::cache::CacheClient;

pub fn build_token_verifier<C: CacheClient>(config: &Config, cache: Arc<C>) -> Arc<TokenVerifier> {
    let store: Arc<dyn TokenStore> = Arc::new(CacheTokenStore::new(
        cache,
        config.access_token_key_prefix.clone(),
    ));

    Arc::new(TokenVerifier::new(
        config.access_token_secret.as_bytes(),
        config.access_token_leeway_seconds,
        store,
    ))
}
