//! In-memory, TTL-aware cache for tests and single-process dev runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{CacheError, Clock, SessionCache, SessionCacheWriter, SystemClock};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Entries are live while `now < expires_at`, so a key written at `t0` with
/// TTL `d` is gone from `t0 + d` onwards. Expired entries are dropped when
/// read and swept on every write.
#[derive(Debug)]
pub struct InMemorySessionCache {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
    reads: Option<Mutex<Vec<String>>>,
}

impl InMemorySessionCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            offline: AtomicBool::new(false),
            reads: None,
        }
    }

    /// Record every key read, for asserting which lookups a caller made.
    pub fn with_read_log(mut self) -> Self {
        self.reads = Some(Mutex::new(Vec::new()));
        self
    }

    /// Number of stored entries, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate an outage: every call fails with [`CacheError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Keys read so far, in order. Empty unless built [`with_read_log`](Self::with_read_log).
    pub fn reads(&self) -> Vec<String> {
        self.reads
            .as_ref()
            .and_then(|r| r.lock().ok().map(|r| r.clone()))
            .unwrap_or_default()
    }

    fn ensure_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("in-memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn poisoned() -> CacheError {
        CacheError::Unavailable("in-memory cache lock poisoned".to_string())
    }
}

impl Default for InMemorySessionCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_online()?;
        if let Some(Ok(mut reads)) = self.reads.as_ref().map(Mutex::lock) {
            reads.push(key.to_string());
        }

        let now = self.clock.now();
        {
            let entries = self.entries.read().map_err(|_| Self::poisoned())?;
            match entries.get(key) {
                Some(e) if now < e.expires_at => return Ok(Some(e.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        if entries.get(key).is_some_and(|e| now >= e.expires_at) {
            entries.remove(key);
        }
        Ok(None)
    }
}

#[async_trait]
impl SessionCacheWriter for InMemorySessionCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_online()?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Command(format!("ttl out of range: {e}")))?;
        let now = self.clock.now();
        let expires_at = now + ttl;

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.retain(|_, e| now < e.expires_at);
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_online()?;
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn cache() -> (Arc<ManualClock>, InMemorySessionCache) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = InMemorySessionCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn entries_expire_at_ttl_boundary() {
        let (clock, cache) = cache();
        cache.set("k", "v".to_string(), Duration::from_secs(60)).await.unwrap();

        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn offline_cache_reports_unavailable() {
        let (_clock, cache) = cache();
        cache.set_offline(true);
        assert!(matches!(cache.get("k").await, Err(CacheError::Unavailable(_))));
    }

    #[tokio::test]
    async fn reads_are_recorded_in_order_when_enabled() {
        let (clock, cache) = cache();
        cache.get("a").await.unwrap();
        assert!(cache.reads().is_empty());

        let cache = InMemorySessionCache::new(clock).with_read_log();
        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        assert_eq!(cache.reads(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn expired_entries_are_reclaimed() {
        let (clock, cache) = cache();
        for i in 0..100 {
            let key = format!("session:{i}");
            cache.set(&key, "v".to_string(), Duration::from_secs(60)).await.unwrap();
        }
        assert_eq!(cache.len(), 100);

        clock.advance(chrono::Duration::hours(1));

        // A read drops the expired key it touched.
        assert_eq!(cache.get("session:0").await.unwrap(), None);
        assert_eq!(cache.len(), 99);

        // A write sweeps everything else that has expired.
        cache.set("fresh", "v".to_string(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 1);

        for _ in 0..1000 {
            cache.get("session:1").await.unwrap();
        }
        assert!(cache.reads().is_empty());
    }
}
