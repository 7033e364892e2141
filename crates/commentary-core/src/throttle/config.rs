//! Throttle configuration and validation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Rejected throttle configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid rate '{0}': expected '<count>/<period>', e.g. '2/min'")]
    InvalidRate(String),

    #[error("{0} must be at least one second")]
    TooShort(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// A request quota such as `2/min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub num_requests: u32,
    /// Nominal period of the quota. The excess-volume throttle prunes against
    /// its lockout instead, so this is informational there.
    pub period: Duration,
}

impl Rate {
    /// Parse a rate where an empty string means "no rate".
    pub fn parse_optional(s: &str) -> Result<Option<Self>, ConfigError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for Rate {
    type Err = ConfigError;

    /// Accepts `<count>/<period>` where the period's first letter picks the
    /// unit: `s`econd, `m`inute, `h`our or `d`ay.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRate(s.to_string());

        let (count, period) = s.trim().split_once('/').ok_or_else(invalid)?;
        let num_requests: u32 = count.trim().parse().map_err(|_| invalid())?;
        if num_requests == 0 {
            return Err(invalid());
        }

        let secs = match period.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('s') => 1,
            Some('m') => 60,
            Some('h') => 60 * 60,
            Some('d') => 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        Ok(Self {
            num_requests,
            period: Duration::from_secs(secs),
        })
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.num_requests, self.period.as_secs())
    }
}

/// Configuration for [`ExcessVolumeThrottle`](super::ExcessVolumeThrottle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcessVolumeConfig {
    /// Quota; `None` disables the policy.
    pub rate: Option<Rate>,
    /// How long creation history is retained, and so how long a caller who
    /// used up the quota stays locked out.
    pub lockout: Duration,
}

impl Default for ExcessVolumeConfig {
    fn default() -> Self {
        Self {
            rate: Some(Rate {
                num_requests: 2,
                period: Duration::from_secs(60),
            }),
            lockout: Duration::from_secs(300),
        }
    }
}

impl ExcessVolumeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lockout.as_secs() == 0 {
            return Err(ConfigError::TooShort("excess-volume lockout"));
        }
        if let Some(rate) = self.rate {
            if rate.num_requests == 0 {
                return Err(ConfigError::Zero("excess-volume request count"));
            }
        }
        Ok(())
    }
}

/// Configuration for [`DuplicateContentThrottle`](super::DuplicateContentThrottle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateContentConfig {
    /// Penalty applied to a caller who posts a duplicate.
    pub lockout: Duration,
    /// How far back to look for an identical comment.
    pub lookback: Duration,
}

impl Default for DuplicateContentConfig {
    fn default() -> Self {
        Self {
            lockout: Duration::from_secs(60),
            lookback: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl DuplicateContentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lockout.as_secs() == 0 {
            return Err(ConfigError::TooShort("duplicate-content lockout"));
        }
        if self.lookback.is_zero() {
            return Err(ConfigError::Zero("duplicate-content lookback"));
        }
        Ok(())
    }
}
