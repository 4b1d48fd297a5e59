use crate::core::cache::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CacheValue {
    value: String,
    expires_at: Instant,
}

/// In-memory cache store using a HashMap behind a tokio Mutex.
///
/// Expiry follows the tokio clock, so a paused runtime can step past a TTL
/// without sleeping.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired ones included until they are read.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            Some(entry) => Instant::now() >= entry.expires_at,
            None => {
                debug!("Cache MISS for key: {}", key);
                return None;
            }
        };
        if expired {
            debug!("Cache entry expired for key: {}", key);
            cache.remove(key);
            return None;
        }
        debug!("Cache HIT for key: {}", key);
        cache.get(key).map(|entry| entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let cache_value = CacheValue {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(key.to_string(), cache_value);
    }
}
