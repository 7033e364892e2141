//! In-memory cache implementation - used as fallback when Redis is unavailable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use commentary_core::ports::{Cache, CacheError};

/// Writes between sweeps of expired entries.
const SWEEP_EVERY: usize = 1024;

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| now < exp)
    }
}

/// In-memory cache using a HashMap behind an async RwLock.
///
/// Throttle state lives here when Redis is not configured. Limits are then
/// per-process rather than shared across instances, and data is lost on
/// restart. Expired entries are hidden on read and swept out periodically on
/// write, so keys for callers who never come back do not pile up.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    writes: AtomicUsize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;
        store
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let before = store.len();
            store.retain(|_, entry| entry.is_live(now));
            tracing::debug!(evicted = before - store.len(), "Swept expired cache entries");
        }

        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|d| now + d),
            },
        );

        Ok(())
    }
}
