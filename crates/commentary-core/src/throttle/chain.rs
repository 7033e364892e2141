use std::sync::Arc;

use super::{Decision, RequestContext, ThrottlePolicy};

/// Ordered set of policies guarding an endpoint.
///
/// Policies are evaluated in insertion order and the first denial wins; later
/// policies are not consulted, so they neither see nor record the request.
#[derive(Clone, Default)]
pub struct ThrottleChain {
    policies: Vec<Arc<dyn ThrottlePolicy>>,
}

impl ThrottleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a policy to the end of the chain.
    pub fn with(mut self, policy: Arc<dyn ThrottlePolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn scopes(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.scope()).collect()
    }

    pub async fn check(&self, ctx: &RequestContext<'_>) -> Decision {
        for policy in &self.policies {
            let decision = policy.evaluate(ctx).await;
            if !decision.is_allowed() {
                tracing::info!(
                    scope = %policy.scope(),
                    caller = %ctx.caller,
                    action = ?ctx.action,
                    wait_secs = ?decision.wait().map(|w| w.as_secs_f64()),
                    "Request throttled"
                );
                return decision;
            }
        }
        Decision::Allow
    }
}
