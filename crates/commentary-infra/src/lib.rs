//! # Commentary Infrastructure
//!
//! Concrete implementations of the ports defined in `commentary-core`.
//! This crate contains the cache, caller rate cap and comment storage backends.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL comment storage via SeaORM
//! - `rate-limit` - Per-caller sliding-log rate cap
//! - `redis` - Redis support for the shared cache and rate cap

pub mod cache;
pub mod database;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, InMemoryCommentRepository, InMemoryContentRepository};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateCapConfig};

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::{PostgresCommentRepository, PostgresContentRepository};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(all(feature = "redis", feature = "rate-limit"))]
pub use rate_limit::RedisRateLimiter;
