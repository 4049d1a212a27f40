use async_trait::async_trait;
use std::time::Duration;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult, WindowHit};

// KEYS[1] = counter key, ARGV[1] = window length in milliseconds.
//
// The window end is stored next to the count, so every caller inside the
// same window sees the same `reset`. Uses the server clock (TIME) so that
// all service instances agree on window boundaries.
const FIXED_WINDOW_LUA: &str = r#"
local now = redis.call('TIME')
local now_ms = tonumber(now[1]) * 1000 + math.floor(tonumber(now[2]) / 1000)
local reset = tonumber(redis.call('HGET', KEYS[1], 'reset'))
if (not reset) or now_ms >= reset then
  reset = now_ms + tonumber(ARGV[1])
  redis.call('DEL', KEYS[1])
  redis.call('HSET', KEYS[1], 'reset', reset)
  redis.call('PEXPIREAT', KEYS[1], reset)
end
local total = redis.call('HINCRBY', KEYS[1], 'count', 1)
return {total, reset, now_ms}
"#;

/// Valkey/Redis-backend cache client.
///
/// Small on purpose: plain `GET`/`DEL` for token records and one Lua script
/// for the rate-limit counter.
#[derive(Clone, Debug)]
pub struct ValkeyClient {
    manager: redis::aio::ConnectionManager,
    window_script: redis::Script,
}

impl ValkeyClient {
    // Create a Valkey client from a URL like `redis://localhost:6379`
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        Ok(Self {
            manager,
            window_script: redis::Script::new(FIXED_WINDOW_LUA),
        })
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        // Use a clone of the connection manager
        let mut conn = self.manager.clone();

        let resp: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))?;

        Ok(resp)
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.manager.clone();

        // DEL returns number of keys removed (0 or 1 for a single key).
        let n: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))?;

        Ok(n)
    }

    async fn incr_window(&self, key: &str, window: Duration) -> CacheResult<WindowHit> {
        let mut conn = self.manager.clone();

        // PEXPIREAT needs at least 1ms, otherwise the key vanishes immediately.
        let window_ms: u64 = u64::try_from(window.as_millis())
            .map_err(|_| CacheError::InvalidValue("window too large".into()))?
            .max(1);

        // EVALSHA, falling back to EVAL when the script is not cached yet.
        let (total, reset_at_ms, now_ms): (u64, i64, i64) = self
            .window_script
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))?;

        Ok(WindowHit {
            total,
            reset_at_ms,
            now_ms,
        })
    }
}
