//! In-crate fakes for exercising policies without infrastructure.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RepoError;
use crate::ports::{Cache, CacheError, CommentHistory, RateLimitError, RateLimitResult, RateLimiter};

/// HashMap cache that ignores TTLs; expiry is driven by the policy clock.
#[derive(Default)]
pub struct MapCache {
    entries: Mutex<HashMap<String, String>>,
    pub writes: Mutex<usize>,
}

impl MapCache {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl Cache for MapCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        *self.writes.lock().unwrap() += 1;
        self.put(key, value);
        Ok(())
    }
}

/// Cache whose backend is down.
pub struct DownCache;

#[async_trait]
impl Cache for DownCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".into()))
    }
}

/// Comment history backed by a list of (text, created_at).
#[derive(Default)]
pub struct FakeHistory {
    comments: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub fail: bool,
}

impl FakeHistory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn record(&self, text: &str, at: DateTime<Utc>) {
        self.comments.lock().unwrap().push((text.to_string(), at));
    }
}

#[async_trait]
impl CommentHistory for FakeHistory {
    async fn posted_since(&self, text: &str, since: DateTime<Utc>) -> Result<bool, RepoError> {
        if self.fail {
            return Err(RepoError::Connection("database unavailable".into()));
        }
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .any(|(t, at)| t == text && *at >= since))
    }
}

/// Rate limiter that replays a fixed answer.
pub struct FixedLimiter(pub Option<RateLimitResult>);

#[async_trait]
impl RateLimiter for FixedLimiter {
    async fn check(&self, _key: &str) -> Result<RateLimitResult, RateLimitError> {
        self.0
            .clone()
            .ok_or_else(|| RateLimitError::Backend("redis down".into()))
    }
}
