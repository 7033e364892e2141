//! Redis per-caller rate cap using a sliding log in a sorted set.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;

use commentary_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::RateCapConfig;
use crate::cache::RedisConfig;

/// Drops entries older than the window, then admits and logs the request if
/// fewer than the limit remain.
/// ARGV: now_ms, window_ms, limit, member. Returns `{allowed, remaining, reset_ms}`.
const SLIDING_LOG_SCRIPT: &str = r#"
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)
local count = redis.call('ZCARD', KEYS[1])
if count < limit then
    redis.call('ZADD', KEYS[1], now, ARGV[4])
    redis.call('PEXPIRE', KEYS[1], window)
    return {1, limit - count - 1, window}
end
local oldest = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
return {0, 0, tonumber(oldest[2]) + window - now}
"#;

/// Redis-backed rate cap, shared across server processes.
///
/// Same semantics as [`InMemoryRateLimiter`](super::InMemoryRateLimiter): at
/// most `max_requests` admitted in any `window`-long span.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RateCapConfig,
    key_prefix: String,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis: &RedisConfig,
        config: RateCapConfig,
        key_prefix: impl Into<String>,
    ) -> Result<Self, RateLimitError> {
        config.validate()?;
        let conn = redis.connect().await.map_err(RateLimitError::Backend)?;

        tracing::info!(url = %redis.url, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            key_prefix: key_prefix.into(),
            script: Script::new(SLIDING_LOG_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let redis_key = format!("{}_{}", self.key_prefix, key);
        let mut conn = self.conn.clone();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let member = format!("{}-{}", now_ms, uuid::Uuid::new_v4());

        let (allowed, remaining, reset_ms): (i64, i64, i64) = self
            .script
            .key(&redis_key)
            .arg(now_ms)
            .arg(self.config.window.as_millis() as u64)
            .arg(self.config.max_requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        Ok(RateLimitResult {
            allowed: allowed == 1,
            remaining: remaining.max(0) as u32,
            reset_after: Duration::from_millis(reset_ms.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get_test_ratelimiter() -> Option<RedisRateLimiter> {
        let redis = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            fallback_to_memory: false,
        };
        let config = RateCapConfig {
            max_requests: 2,
            window: Duration::from_secs(1),
        };

        RedisRateLimiter::new(&redis, config, "test_throttle_anon")
            .await
            .ok()
    }

    #[tokio::test]
    async fn test_redis_ratelimiter() {
        let Some(limiter) = get_test_ratelimiter().await else {
            return;
        };
        let key = format!("caller-{}", uuid::Uuid::new_v4());

        let res = limiter.check(&key).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 1);

        let res = limiter.check(&key).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);

        let res = limiter.check(&key).await.unwrap();
        assert!(!res.allowed);
        assert!(res.reset_after <= Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(limiter.check(&key).await.unwrap().allowed);
    }
}
