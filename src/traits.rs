use async_trait::async_trait;

use crate::error::AuthError;
use crate::types::{AuthCheckCriteria, AuthCheckResult, PdpDecision};

/// The authorization-check contract consumers depend on.
///
/// An `Ok` result carries the decision in `allowed`; any `Err` means no
/// decision was made and must never be treated as an allow.
#[async_trait]
pub trait AuthCheck: Send + Sync {
    async fn check(&self, criteria: &AuthCheckCriteria) -> Result<AuthCheckResult, AuthError>;
}

/// A policy decision point the façade delegates to.
///
/// Implementations receive criteria that already passed validation and are
/// called concurrently, so they must be safe for shared use.
#[async_trait]
pub trait DecisionPoint: Send + Sync {
    /// Ask the PDP whether the subject may perform the action on the resource.
    async fn check(&self, criteria: &AuthCheckCriteria) -> Result<PdpDecision, AuthError>;

    /// Short name used in log fields.
    fn name(&self) -> &'static str {
        "pdp"
    }
}

/// A decision point that is declared but not connected to anything.
///
/// Every check fails with [`AuthError::NotImplemented`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwiredDecisionPoint;

#[async_trait]
impl DecisionPoint for UnwiredDecisionPoint {
    async fn check(&self, _criteria: &AuthCheckCriteria) -> Result<PdpDecision, AuthError> {
        Err(AuthError::NotImplemented)
    }

    fn name(&self) -> &'static str {
        "unwired"
    }
}
