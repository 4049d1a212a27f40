use std::{future::Future, pin::Pin, sync::Arc};

use crate::services::cache::{CacheClient, CacheError};

/// Lookup of issued token records.
///
/// Records are written by the token issuer (another service); this side only
/// reads them, and deletes them on logout.
///
/// - `Ok(Some(record))`: session still valid
/// - `Ok(None)`: expired or revoked
/// - `Err(_)`: store failure (caller fails closed)
pub trait TokenStore: Send + Sync {
    fn fetch<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, TokenStoreError>> + Send + 'a>>;

    // Returns true when a record was removed.
    fn revoke<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, TokenStoreError>> + Send + 'a>>;
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// `TokenStore` on top of any `CacheClient`.
///
/// Records live under `<prefix>:<credential>`.
#[derive(Clone)]
pub struct CacheTokenStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
}

impl<C: CacheClient> CacheTokenStore<C> {
    pub fn new(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, credential: &str) -> String {
        format!("{}:{}", self.prefix, credential)
    }
}

impl<C: CacheClient> TokenStore for CacheTokenStore<C> {
    fn fetch<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, TokenStoreError>> + Send + 'a>> {
        Box::pin(async move {
            let record = self.cache.get_string(&self.key(credential)).await?;
            Ok(record)
        })
    }

    fn revoke<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, TokenStoreError>> + Send + 'a>> {
        Box::pin(async move {
            let removed = self.cache.del(&self.key(credential)).await?;
            Ok(removed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::memory::MemoryCache;

    #[test]
    fn key_is_prefixed_with_namespace() {
        let store = CacheTokenStore::new(Arc::new(MemoryCache::new()), "access_token");
        assert_eq!(store.key("abc"), "access_token:abc");
    }

    #[tokio::test]
    async fn fetch_reads_namespaced_record() {
        let cache = MemoryCache::new();
        cache.insert("access_token:abc", "record");
        cache.insert("abc", "unrelated");
        let store = CacheTokenStore::new(Arc::new(cache), "access_token");

        assert_eq!(store.fetch("abc").await.unwrap().as_deref(), Some("record"));
        assert!(store.fetch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoke_deletes_record_once() {
        let cache = MemoryCache::new();
        cache.insert("access_token:abc", "record");
        let store = CacheTokenStore::new(Arc::new(cache.clone()), "access_token");

        assert!(store.revoke("abc").await.unwrap());
        assert!(!store.revoke("abc").await.unwrap());
        assert!(!cache.contains("access_token:abc"));
    }

    #[tokio::test]
    async fn backend_failure_is_an_error_not_a_miss() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);
        let store = CacheTokenStore::new(Arc::new(cache), "access_token");

        assert!(matches!(
            store.fetch("abc").await,
            Err(TokenStoreError::Cache(CacheError::BackendConnection(_)))
        ));
    }
}
