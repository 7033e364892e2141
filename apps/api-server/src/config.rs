//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use commentary_core::throttle::{ConfigError, DuplicateContentConfig, ExcessVolumeConfig, Rate};
use commentary_infra::RateCapConfig;
use commentary_infra::database::DatabaseConfig;

#[cfg(feature = "redis")]
use commentary_infra::RedisConfig;

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub throttle: ThrottleSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| env::var(key).ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: RedisConfig::from_env(),
            throttle: ThrottleSettings::from_lookup(lookup)?,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}

/// Settings for every throttle policy, validated on load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThrottleSettings {
    pub excess: ExcessVolumeConfig,
    pub duplicate: DuplicateContentConfig,
    pub rate_cap: RateCapConfig,
}

impl ThrottleSettings {
    /// Build settings from a key lookup, falling back to defaults for unset
    /// keys. An unparsable value is an error rather than a silent default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rate = match lookup("EXCESS_COMMENTS_RATE") {
            Some(raw) => Rate::parse_optional(&raw)?,
            None => defaults.excess.rate,
        };
        let excess = ExcessVolumeConfig {
            rate,
            lockout: secs_or(&lookup, "EXCESS_COMMENTS_LOCKOUT", defaults.excess.lockout)?,
        };

        let hours: u64 = parse_or(
            &lookup,
            "DUPLICATE_COMMENT_HOURS",
            defaults.duplicate.lookback.as_secs() / 3600,
        )?;
        let duplicate = DuplicateContentConfig {
            lockout: secs_or(&lookup, "DUPLICATE_COMMENT_LOCKOUT", defaults.duplicate.lockout)?,
            lookback: Duration::from_secs(hours.saturating_mul(3600)),
        };

        let rate_cap = RateCapConfig {
            max_requests: parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", defaults.rate_cap.max_requests)?,
            window: secs_or(&lookup, "RATE_LIMIT_WINDOW_SECS", defaults.rate_cap.window)?,
        };

        let settings = Self {
            excess,
            duplicate,
            rate_cap,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.excess.validate()?;
        self.duplicate.validate()?;
        if self.rate_cap.max_requests == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_MAX_REQUESTS"));
        }
        if self.rate_cap.window.as_secs() == 0 {
            return Err(ConfigError::TooShort("RATE_LIMIT_WINDOW_SECS"));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ThrottleSettings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ThrottleSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings, ThrottleSettings::default());
        assert_eq!(settings.excess.rate.unwrap().num_requests, 2);
        assert_eq!(settings.excess.lockout, Duration::from_secs(300));
        assert_eq!(settings.duplicate.lockout, Duration::from_secs(60));
        assert_eq!(settings.duplicate.lookback, Duration::from_secs(24 * 3600));
        assert_eq!(settings.rate_cap.max_requests, 20);
    }

    #[test]
    fn test_overrides() {
        let settings = load(&[
            ("EXCESS_COMMENTS_RATE", "5/hour"),
            ("EXCESS_COMMENTS_LOCKOUT", "600"),
            ("DUPLICATE_COMMENT_LOCKOUT", "30"),
            ("DUPLICATE_COMMENT_HOURS", "1"),
            ("RATE_LIMIT_MAX_REQUESTS", "100"),
            ("RATE_LIMIT_WINDOW_SECS", "10"),
        ])
        .unwrap();

        let rate = settings.excess.rate.unwrap();
        assert_eq!(rate.num_requests, 5);
        assert_eq!(rate.period, Duration::from_secs(3600));
        assert_eq!(settings.excess.lockout, Duration::from_secs(600));
        assert_eq!(settings.duplicate.lockout, Duration::from_secs(30));
        assert_eq!(settings.duplicate.lookback, Duration::from_secs(3600));
        assert_eq!(settings.rate_cap.max_requests, 100);
        assert_eq!(settings.rate_cap.window, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_rate_disables_excess_volume() {
        let settings = load(&[("EXCESS_COMMENTS_RATE", "")]).unwrap();
        assert!(settings.excess.rate.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            load(&[("EXCESS_COMMENTS_LOCKOUT", "soon")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            load(&[("EXCESS_COMMENTS_RATE", "2/fortnight")]),
            Err(ConfigError::InvalidRate(_))
        ));
        assert!(load(&[("DUPLICATE_COMMENT_LOCKOUT", "0")]).is_err());
        assert!(load(&[("DUPLICATE_COMMENT_HOURS", "0")]).is_err());
        assert_eq!(
            load(&[("RATE_LIMIT_MAX_REQUESTS", "0")]),
            Err(ConfigError::Zero("RATE_LIMIT_MAX_REQUESTS"))
        );
    }
}
