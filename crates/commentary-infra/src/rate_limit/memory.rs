//! In-memory per-caller rate cap using a sliding log.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use commentary_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::RateCapConfig;

/// Checks between sweeps of callers with no requests left in the window.
const PRUNE_EVERY: usize = 4096;

/// In-memory rate cap keyed by caller.
///
/// Keeps the instant of every admitted request inside the window, so at most
/// `max_requests` are admitted in any `window`-long span. Refused requests are
/// not logged.
///
/// This is the fallback when Redis is not available.
/// Note: Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    log: Mutex<HashMap<String, VecDeque<Instant>>>,
    config: RateCapConfig,
    checks: AtomicUsize,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateCapConfig) -> Result<Self, RateLimitError> {
        config.validate()?;
        Ok(Self {
            log: Mutex::new(HashMap::new()),
            config,
            checks: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let now = Instant::now();
        let window = self.config.window;
        let mut log = self.log.lock().await;

        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            log.retain(|_, hits| {
                hits.back()
                    .is_some_and(|&last| now.duration_since(last) < window)
            });
        }

        let hits = log.entry(key.to_string()).or_default();
        while let Some(&oldest) = hits.front() {
            if now.duration_since(oldest) >= window {
                hits.pop_front();
            } else {
                break;
            }
        }

        let max = self.config.max_requests as usize;
        if hits.len() < max {
            hits.push_back(now);
            return Ok(RateLimitResult {
                allowed: true,
                remaining: (max - hits.len()) as u32,
                reset_after: window,
            });
        }

        let reset_after = hits
            .front()
            .map(|&oldest| window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(window);
        Ok(RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(max_requests: u32, window: Duration) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateCapConfig {
            max_requests,
            window,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_caps_each_caller_separately() {
        let limiter = limiter(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        }
        let denied = limiter.check("10.0.0.1").await.unwrap();
        assert!(!denied.allowed);
        assert!(denied.reset_after > Duration::from_secs(59));

        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_remaining_counts_down() {
        let limiter = limiter(2, Duration::from_secs(60));
        assert_eq!(limiter.check("10.0.0.1").await.unwrap().remaining, 1);
        assert_eq!(limiter.check("10.0.0.1").await.unwrap().remaining, 0);
    }

    #[tokio::test]
    async fn test_no_refill_before_window_ends() {
        let limiter = limiter(3, Duration::from_millis(900));

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        }

        // A third of the window is long enough for a token bucket to refill
        // one slot; the log must still refuse.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
    }

    #[test]
    fn test_rejects_zero_quota() {
        let result = InMemoryRateLimiter::new(RateCapConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        });
        assert!(result.is_err());
    }
}
