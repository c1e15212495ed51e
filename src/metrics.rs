//! Vendor-agnostic check metrics via a pluggable sink.
//!
//! Implement [`MetricsSink`] to feed check outcomes into Prometheus,
//! OpenTelemetry or anything else, then attach it to a façade:
//!
//! ```ignore
//! use permit_authz::{AuthFacade, CheckStats, MetricsSink};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct CounterSink {
//!     checks: AtomicU64,
//! }
//!
//! impl MetricsSink for CounterSink {
//!     fn on_check(&self, stats: &CheckStats) {
//!         self.checks.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let facade = AuthFacade::new(config)?.with_metrics_sink(Arc::new(CounterSink::default()));
//! ```
//!
//! The sink belongs to the façade that carries it. There is no global sink.

use std::time::Duration;

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::error::AuthError;
use crate::types::{AuthCheckCriteria, AuthCheckResult};

/// How a check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckOutcome {
    Allowed,
    Denied,
    /// No decision; see [`CheckStats::error_kind`].
    Failed,
}

/// Snapshot of one check, passed to [`MetricsSink::on_check`].
#[derive(Debug, Clone, Serialize)]
pub struct CheckStats {
    /// Wall-clock time from validation to the PDP's answer
    pub duration: Duration,
    pub outcome: CheckOutcome,
    /// Set when `outcome` is `Failed`, e.g. `unreachable_service`
    pub error_kind: Option<String>,
    pub subject: String,
    pub action: String,
    pub resource: String,
}

impl CheckStats {
    pub(crate) fn new(
        criteria: &AuthCheckCriteria,
        result: &Result<AuthCheckResult, AuthError>,
        duration: Duration,
    ) -> Self {
        let (outcome, error_kind) = match result {
            Ok(r) if r.allowed => (CheckOutcome::Allowed, None),
            Ok(_) => (CheckOutcome::Denied, None),
            Err(e) => (CheckOutcome::Failed, Some(e.kind().to_string())),
        };
        CheckStats {
            duration,
            outcome,
            error_kind,
            subject: criteria.subject().to_string(),
            action: criteria.action().to_string(),
            resource: criteria.resource().to_string(),
        }
    }
}

/// Consumer of check metrics.
///
/// Called synchronously at the end of every check, from whatever task ran
/// it, so implementations must be thread-safe and should not block.
pub trait MetricsSink: Send + Sync {
    fn on_check(&self, stats: &CheckStats);
}

/// Sink used when none is attached.
pub(crate) struct NoOpSink;

impl MetricsSink for NoOpSink {
    fn on_check(&self, _stats: &CheckStats) {}
}
