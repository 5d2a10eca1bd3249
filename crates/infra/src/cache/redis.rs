//! Redis-backed session cache.
//!
//! Reads are plain `GET`s; writes (used by login/logout/OTP collaborators,
//! never by the pipeline) are `SET .. EX` so Redis owns expiry. Connection
//! and timeout errors surface as [`CacheError::Unavailable`] so the pipeline
//! can tell "could not determine" from "no such session".

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::{instrument, warn};

use edugate_auth::{CacheError, SessionCache, SessionCacheWriter};

#[derive(Clone)]
pub struct RedisSessionCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionCache {
    /// Connect to Redis (e.g. `redis://localhost:6379`).
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client).await.map_err(map_redis_error)?;
        Ok(Self {
            conn,
            key_prefix: String::new(),
        })
    }

    /// Namespace every key (e.g. `"edugate:"` → `edugate:session:{id}`).
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl core::fmt::Debug for RedisSessionCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisSessionCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(e: RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        warn!(error = %e, "redis unavailable");
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Command(e.to_string())
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    #[instrument(skip_all)]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.key(key))
            .await
            .map_err(map_redis_error)
    }
}

#[async_trait]
impl SessionCacheWriter for RedisSessionCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key)).await.map_err(map_redis_error)
    }
}
