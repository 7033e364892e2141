//! Adapter that puts a [`RateLimiter`] at the front of a throttle chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::RateLimiter;

use super::{Decision, RequestContext, ThrottlePolicy};

/// General per-caller request cap, applied to every action.
pub struct RateCapThrottle {
    limiter: Arc<dyn RateLimiter>,
}

impl RateCapThrottle {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl ThrottlePolicy for RateCapThrottle {
    fn scope(&self) -> &str {
        "anon"
    }

    async fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        match self.limiter.check(ctx.caller).await {
            Ok(result) if result.allowed => Decision::Allow,
            Ok(result) => Decision::Deny {
                wait: Some(result.reset_after),
            },
            Err(e) => {
                tracing::warn!(caller = %ctx.caller, error = %e, "Rate limiter error, failing open");
                Decision::Allow
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RateLimitResult;
    use crate::throttle::Action;
    use crate::throttle::test_support::FixedLimiter;
    use std::time::Duration;

    #[tokio::test]
    async fn test_maps_limiter_result() {
        let ctx = RequestContext::new("10.0.0.1", Action::List);

        let allow = RateCapThrottle::new(Arc::new(FixedLimiter(Some(RateLimitResult {
            allowed: true,
            remaining: 3,
            reset_after: Duration::from_secs(60),
        }))));
        assert!(allow.evaluate(&ctx).await.is_allowed());

        let deny = RateCapThrottle::new(Arc::new(FixedLimiter(Some(RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_after: Duration::from_secs(12),
        }))));
        assert_eq!(deny.evaluate(&ctx).await.wait(), Some(Duration::from_secs(12)));
    }

    #[tokio::test]
    async fn test_backend_error_fails_open() {
        let throttle = RateCapThrottle::new(Arc::new(FixedLimiter(None)));
        let ctx = RequestContext::new("10.0.0.1", Action::Create);
        assert!(throttle.evaluate(&ctx).await.is_allowed());
    }
}
