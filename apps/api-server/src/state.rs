//! Application state - shared across all handlers.

use std::sync::Arc;

use commentary_core::ports::{
    Cache, Clock, CommentHistory, CommentRepository, ContentRepository, RateLimitError,
    RateLimiter, SystemClock,
};
use commentary_core::throttle::{
    ConfigError, DuplicateContentThrottle, ExcessVolumeThrottle, RateCapThrottle, ThrottleChain,
};
use commentary_infra::{
    InMemoryCache, InMemoryCommentRepository, InMemoryContentRepository, InMemoryRateLimiter,
};

#[cfg(feature = "postgres")]
use commentary_infra::{PostgresCommentRepository, PostgresContentRepository, database};

#[cfg(feature = "redis")]
use commentary_infra::{RedisCache, RedisConfig, RedisRateLimiter};

use crate::config::{AppConfig, ThrottleSettings};

/// Failure to assemble the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("rate cap unavailable: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("Redis unavailable: {0}")]
    Redis(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub clock: Arc<dyn Clock>,
    pub comments: Arc<dyn CommentRepository>,
    pub contents: Arc<dyn ContentRepository>,
    /// Rate cap, excess volume and duplicate content, in that order.
    pub comment_throttle: ThrottleChain,
    /// Rate cap only.
    pub content_throttle: ThrottleChain,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (cache, limiter) = Self::throttle_backends(config).await?;

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match database::connect(db_config).await {
                Ok(conn) => {
                    let comments = Arc::new(PostgresCommentRepository::new(conn.clone()));
                    let contents = Arc::new(PostgresContentRepository::new(conn));
                    return Self::assemble(
                        &config.throttle,
                        cache,
                        limiter,
                        comments,
                        contents,
                        clock,
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without postgres feature");
        }

        Self::assemble(
            &config.throttle,
            cache,
            limiter,
            Arc::new(InMemoryCommentRepository::new()),
            Arc::new(InMemoryContentRepository::new()),
            clock,
        )
    }

    /// Fully in-memory state driven by the given clock.
    pub fn in_memory(
        settings: &ThrottleSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let limiter = Arc::new(InMemoryRateLimiter::new(settings.rate_cap.clone())?);
        Self::assemble(
            settings,
            Arc::new(InMemoryCache::new()),
            limiter,
            Arc::new(InMemoryCommentRepository::new()),
            Arc::new(InMemoryContentRepository::new()),
            clock,
        )
    }

    fn assemble<R>(
        settings: &ThrottleSettings,
        cache: Arc<dyn Cache>,
        limiter: Arc<dyn RateLimiter>,
        comments: Arc<R>,
        contents: Arc<dyn ContentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError>
    where
        R: CommentRepository + CommentHistory + 'static,
    {
        let history: Arc<dyn CommentHistory> = comments.clone();
        let rate_cap = Arc::new(RateCapThrottle::new(limiter));

        let comment_throttle = ThrottleChain::new()
            .with(rate_cap.clone())
            .with(Arc::new(ExcessVolumeThrottle::new(
                cache.clone(),
                clock.clone(),
                settings.excess.clone(),
            )?))
            .with(Arc::new(DuplicateContentThrottle::new(
                cache,
                history,
                clock.clone(),
                settings.duplicate.clone(),
            )?));
        let content_throttle = ThrottleChain::new().with(rate_cap);

        tracing::info!(
            comments = ?comment_throttle.scopes(),
            content = ?content_throttle.scopes(),
            "Throttle chains configured"
        );

        Ok(Self {
            clock,
            comments,
            contents,
            comment_throttle,
            content_throttle,
        })
    }

    /// Pick the cache and rate cap backends: Redis when configured, memory
    /// otherwise.
    async fn throttle_backends(
        config: &AppConfig,
    ) -> Result<(Arc<dyn Cache>, Arc<dyn RateLimiter>), StartupError> {
        #[cfg(feature = "redis")]
        if let Some(redis) = &config.redis {
            match Self::redis_backends(redis, config).await {
                Ok(backends) => return Ok(backends),
                Err(e) if redis.fallback_to_memory => {
                    tracing::warn!("Redis unavailable: {}. Using in-memory throttle state.", e);
                }
                Err(e) => return Err(e),
            }
        }

        let limiter = InMemoryRateLimiter::new(config.throttle.rate_cap.clone())?;
        Ok((Arc::new(InMemoryCache::new()), Arc::new(limiter)))
    }

    #[cfg(feature = "redis")]
    async fn redis_backends(
        redis: &RedisConfig,
        config: &AppConfig,
    ) -> Result<(Arc<dyn Cache>, Arc<dyn RateLimiter>), StartupError> {
        let cache = RedisCache::new(redis)
            .await
            .map_err(|e| StartupError::Redis(e.to_string()))?;
        let limiter =
            RedisRateLimiter::new(redis, config.throttle.rate_cap.clone(), "throttle_anon")
                .await
                .map_err(|e| StartupError::Redis(e.to_string()))?;
        Ok((Arc::new(cache), Arc::new(limiter)))
    }
}
