//! Authorization check results and the raw PDP answer they are mapped from.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// The decision a policy decision point returned, before the façade maps it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PdpDecision {
    pub allow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Opaque diagnostics from the PDP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

/// Outcome of an authorization check. `allowed` is the only authoritative answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AuthCheckResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AuthCheckResult {
    pub fn allow() -> Self {
        AuthCheckResult {
            allowed: true,
            reason: None,
            metadata: None,
        }
    }

    pub fn deny() -> Self {
        AuthCheckResult {
            allowed: false,
            reason: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_reason<T: Into<String>>(mut self, reason: T) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

impl From<PdpDecision> for AuthCheckResult {
    fn from(decision: PdpDecision) -> Self {
        AuthCheckResult {
            allowed: decision.allow,
            reason: decision.reason,
            metadata: decision.debug,
        }
    }
}

impl Display for AuthCheckResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let verdict = if self.allowed { "Allow" } else { "Deny" };
        match &self.reason {
            Some(reason) => write!(f, "{verdict}({reason})"),
            None => write!(f, "{verdict}"),
        }
    }
}
