//! Per-caller rate cap implementations.

use std::time::Duration;

use commentary_core::ports::RateLimitError;

mod memory;

pub use memory::InMemoryRateLimiter;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisRateLimiter;

/// How many requests a single caller may make per window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCapConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateCapConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateCapConfig {
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.max_requests == 0 {
            return Err(RateLimitError::Config(
                "max_requests must be greater than zero".to_string(),
            ));
        }
        if self.window.as_secs() == 0 {
            return Err(RateLimitError::Config(
                "window must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
