//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod cache;
mod clock;
mod rate_limit;
mod repository;

pub use cache::{Cache, CacheError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, CommentHistory, CommentRepository, ContentRepository};
