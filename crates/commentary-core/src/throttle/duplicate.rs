//! Duplicate-content throttle: locks out a caller who posts text identical to
//! a recent comment.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::{Cache, Clock, CommentHistory};

use super::config::{ConfigError, DuplicateContentConfig};
use super::{Decision, RequestContext, ThrottlePolicy, cache_key, elapsed};

const SCOPE: &str = "recent_dupe";

/// Throttles a caller who submits a comment that exactly matches any comment
/// posted in the lookback window.
///
/// Only the comment text is compared; who posted the earlier comment and which
/// content it was posted against do not matter. The penalty, however, lands on
/// the caller who sent the duplicate: a lockout marker is stored under their
/// identity and every request they make is refused until it expires, reads
/// included.
pub struct DuplicateContentThrottle {
    cache: Arc<dyn Cache>,
    history: Arc<dyn CommentHistory>,
    clock: Arc<dyn Clock>,
    config: DuplicateContentConfig,
    lookback: chrono::Duration,
}

impl DuplicateContentThrottle {
    pub fn new(
        cache: Arc<dyn Cache>,
        history: Arc<dyn CommentHistory>,
        clock: Arc<dyn Clock>,
        config: DuplicateContentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let lookback = chrono::Duration::from_std(config.lookback).map_err(|_| {
            ConfigError::InvalidValue {
                key: "duplicate-content lookback".to_string(),
                value: format!("{:?}", config.lookback),
            }
        })?;

        Ok(Self {
            cache,
            history,
            clock,
            config,
            lookback,
        })
    }

    /// Time (unix millis) the caller's current lockout started, if one is live.
    ///
    /// A marker older than the lockout is ignored even if the cache has not
    /// evicted it yet.
    async fn active_lockout(&self, key: &str, now: i64) -> Option<i64> {
        let raw = self.cache.get(key).await?;
        let started: i64 = match raw.parse() {
            Ok(started) => started,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable lockout marker");
                return None;
            }
        };

        (elapsed(now, started) < self.config.lockout).then_some(started)
    }

    async fn lock_out(&self, key: &str, now: i64) {
        if let Err(e) = self
            .cache
            .set(key, &now.to_string(), Some(self.config.lockout))
            .await
        {
            tracing::warn!(key = %key, error = %e, "Failed to persist lockout marker");
        }
    }
}

#[async_trait]
impl ThrottlePolicy for DuplicateContentThrottle {
    fn scope(&self) -> &str {
        SCOPE
    }

    async fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let key = cache_key(SCOPE, ctx.caller);

        if let Some(started) = self.active_lockout(&key, now_ms).await {
            let wait = self.config.lockout.saturating_sub(elapsed(now_ms, started));
            return Decision::Deny { wait: Some(wait) };
        }

        if !ctx.action.is_create() {
            return Decision::Allow;
        }
        let Some(text) = ctx.comment else {
            return Decision::Allow;
        };

        match self.history.posted_since(text, now - self.lookback).await {
            Ok(true) => {
                tracing::info!(caller = %ctx.caller, "Recent duplicate comment, locking out caller");
                self.lock_out(&key, now_ms).await;
                Decision::Deny {
                    wait: Some(self.config.lockout),
                }
            }
            Ok(false) => Decision::Allow,
            Err(e) => {
                tracing::warn!(error = %e, "Duplicate comment lookup failed, failing open");
                Decision::Allow
            }
        }
    }
}
