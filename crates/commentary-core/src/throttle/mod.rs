//! Request throttling engine.
//!
//! A throttle is a [`ThrottlePolicy`]: given who is calling and what they are
//! trying to do, it returns a [`Decision`]. Policies keep their per-caller
//! state in the shared [`Cache`](crate::ports::Cache) under keys scoped by
//! policy name, so several policies (and several server processes) can share
//! one cache backend without stepping on each other.
//!
//! Policies are composed with a [`ThrottleChain`], which runs them in order and
//! stops at the first denial.
//!
//! # Failure policy
//!
//! Throttling fails open. A cache that is unreachable or holds a value that
//! cannot be decoded is treated as holding no history, a failed cache write
//! still lets the request through, and a failed history query counts as "no
//! duplicate". Each of these is logged at `warn`. Misconfiguration, on the
//! other hand, is rejected up front by the policy constructors.

use std::time::Duration;

use async_trait::async_trait;

mod chain;
mod config;
mod duplicate;
mod excess;
mod rate_cap;

#[cfg(test)]
mod test_support;

pub use chain::ThrottleChain;
pub use config::{ConfigError, DuplicateContentConfig, ExcessVolumeConfig, Rate};
pub use duplicate::DuplicateContentThrottle;
pub use excess::ExcessVolumeThrottle;
pub use rate_cap::RateCapThrottle;

/// What the caller is attempting. Only [`Action::Create`] consumes quota or
/// triggers duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    /// Full or partial replacement of an existing record.
    Update,
    Destroy,
}

impl Action {
    pub fn is_create(self) -> bool {
        matches!(self, Action::Create)
    }
}

/// Everything a policy may look at for one request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Caller identity, usually the client address.
    pub caller: &'a str,
    pub action: Action,
    /// Comment text being submitted, for creation attempts.
    pub comment: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn new(caller: &'a str, action: Action) -> Self {
        Self {
            caller,
            action,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: &'a str) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Outcome of evaluating a request against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Denied. `wait` is the suggested delay before retrying; `None` means the
    /// policy cannot name one and the caller should back off as long as it can.
    Deny { wait: Option<Duration> },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Suggested retry delay. Always `None` for [`Decision::Allow`].
    pub fn wait(&self) -> Option<Duration> {
        match self {
            Decision::Allow => None,
            Decision::Deny { wait } => *wait,
        }
    }
}

/// A single throttling rule.
#[async_trait]
pub trait ThrottlePolicy: Send + Sync {
    /// Short name used to scope cache keys and in logs.
    fn scope(&self) -> &str;

    async fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision;
}

pub(crate) fn cache_key(scope: &str, ident: &str) -> String {
    format!("throttle_{}_{}", scope, ident)
}

/// Milliseconds from `then` to `now`, clamped at zero.
pub(crate) fn elapsed(now_ms: i64, then_ms: i64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(then_ms).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_scoped_by_policy() {
        assert_eq!(
            cache_key("excess_comment", "10.0.0.1"),
            "throttle_excess_comment_10.0.0.1"
        );
        assert_ne!(cache_key("a", "x"), cache_key("b", "x"));
    }

    #[test]
    fn test_decision_wait() {
        assert_eq!(Decision::Allow.wait(), None);
        let deny = Decision::Deny {
            wait: Some(Duration::from_secs(3)),
        };
        assert!(!deny.is_allowed());
        assert_eq!(deny.wait(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_only_create_counts_as_creation() {
        assert!(Action::Create.is_create());
        for action in [Action::List, Action::Retrieve, Action::Update, Action::Destroy] {
            assert!(!action.is_create(), "{action:?}");
        }
    }

    #[test]
    fn test_elapsed_never_negative() {
        assert_eq!(elapsed(1_000, 2_000), Duration::ZERO);
        assert_eq!(elapsed(2_500, 1_000), Duration::from_millis(1_500));
    }
}
