//! Excess-volume throttle: caps how many comments a caller may create within
//! the lockout window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{Cache, Clock};

use super::config::{ConfigError, ExcessVolumeConfig, Rate};
use super::{Decision, RequestContext, ThrottlePolicy, cache_key, elapsed};

const SCOPE: &str = "excess_comment";

/// Throttles a caller for creating too many comments in a short time.
///
/// Each caller's creation timestamps are kept in the cache, newest first, for
/// the full lockout duration rather than the nominal rate period. Once the
/// quota is used up the caller is therefore refused until the oldest recorded
/// creation is `lockout` old, not merely until the rate period rolls over.
/// Reads are checked against the quota but never recorded.
///
/// The read-modify-write on the history is not atomic. Concurrent requests
/// from one caller may both be admitted at the quota boundary.
pub struct ExcessVolumeThrottle {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    config: ExcessVolumeConfig,
}

impl ExcessVolumeThrottle {
    pub fn new(
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        config: ExcessVolumeConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache,
            clock,
            config,
        })
    }

    /// Timestamps (unix millis, newest first) recorded for `key`.
    async fn load_history(&self, key: &str) -> Vec<i64> {
        let Some(raw) = self.cache.get(key).await else {
            return Vec::new();
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable throttle history");
            Vec::new()
        })
    }

    async fn store_history(&self, key: &str, history: &[i64]) {
        let value = match serde_json::to_string(history) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode throttle history");
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set(key, &value, Some(self.config.lockout))
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to persist throttle history, failing open");
        }
    }

    fn wait(&self, rate: Rate, history: &[i64], now: i64) -> Option<Duration> {
        let remaining = match history.last() {
            Some(&oldest) => self.config.lockout.saturating_sub(elapsed(now, oldest)),
            None => self.config.lockout,
        };

        let available = i64::from(rate.num_requests) - history.len() as i64 + 1;
        if available <= 0 {
            return None;
        }

        Some(remaining / available as u32)
    }
}

#[async_trait]
impl ThrottlePolicy for ExcessVolumeThrottle {
    fn scope(&self) -> &str {
        SCOPE
    }

    async fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        let Some(rate) = self.config.rate else {
            return Decision::Allow;
        };

        let key = cache_key(SCOPE, ctx.caller);
        let mut history = self.load_history(&key).await;
        let now = self.clock.now().timestamp_millis();

        // Drop everything that has aged out of the lockout window.
        let horizon = now - self.config.lockout.as_millis() as i64;
        while history.last().is_some_and(|&oldest| oldest <= horizon) {
            history.pop();
        }

        if history.len() >= rate.num_requests as usize {
            let wait = self.wait(rate, &history, now);
            tracing::debug!(
                caller = %ctx.caller,
                recent = history.len(),
                quota = rate.num_requests,
                "Excess comment volume"
            );
            return Decision::Deny { wait };
        }

        if ctx.action.is_create() {
            history.insert(0, now);
            self.store_history(&key, &history).await;
        }

        Decision::Allow
    }
}
