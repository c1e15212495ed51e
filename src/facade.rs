use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PermitConfig;
use crate::error::AuthError;
use crate::metrics::{CheckStats, MetricsSink, NoOpSink};
use crate::permit::PermitClient;
use crate::traits::{AuthCheck, DecisionPoint, UnwiredDecisionPoint};
use crate::types::{AuthCheckCriteria, AuthCheckResult};

/// The authorization façade. Cloneable and thread-safe; clones share the
/// same decision point handle.
#[derive(Clone)]
pub struct AuthFacade {
    pdp: Arc<dyn DecisionPoint>,
    metrics: Arc<dyn MetricsSink>,
}

impl AuthFacade {
    /// Build a façade backed by a Permit PDP.
    pub fn new(config: &PermitConfig) -> Result<Self, AuthError> {
        let client = PermitClient::new(config)?;
        info!(
            event = "Facade",
            phase = "Init",
            pdp = client.name(),
            endpoint = config.endpoint().as_str()
        );
        Ok(Self::with_decision_point(Arc::new(client)))
    }

    /// Build a Permit-backed façade from the `PERMIT_*` environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::new(&PermitConfig::from_env()?)
    }

    /// A façade that is configured but not wired to any PDP. Every valid
    /// check fails with [`AuthError::NotImplemented`].
    pub fn unwired(config: &PermitConfig) -> Self {
        warn!(
            event = "Facade",
            phase = "Init",
            pdp = UnwiredDecisionPoint.name(),
            endpoint = config.endpoint().as_str()
        );
        Self::with_decision_point(Arc::new(UnwiredDecisionPoint))
    }

    pub fn with_decision_point(pdp: Arc<dyn DecisionPoint>) -> Self {
        AuthFacade {
            pdp,
            metrics: Arc::new(NoOpSink),
        }
    }

    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    pub fn decision_point_name(&self) -> &'static str {
        self.pdp.name()
    }

    /// Ask the PDP whether `criteria` is allowed.
    ///
    /// Criteria are validated first; invalid criteria never reach the PDP.
    pub async fn check(&self, criteria: &AuthCheckCriteria) -> Result<AuthCheckResult, AuthError> {
        self.run(criteria, None).await
    }

    /// Like [`AuthFacade::check`], but gives up with [`AuthError::Cancelled`]
    /// as soon as `cancel` fires, dropping the in-flight PDP request.
    pub async fn check_with_cancel(
        &self,
        criteria: &AuthCheckCriteria,
        cancel: &CancellationToken,
    ) -> Result<AuthCheckResult, AuthError> {
        self.run(criteria, Some(cancel)).await
    }

    async fn run(
        &self,
        criteria: &AuthCheckCriteria,
        cancel: Option<&CancellationToken>,
    ) -> Result<AuthCheckResult, AuthError> {
        debug!(
            event = "Check",
            phase = "Request",
            pdp = self.pdp.name(),
            subject = criteria.subject(),
            action = criteria.action(),
            resource = criteria.resource().to_string(),
            tenant = criteria.tenant()
        );

        let started = Instant::now();
        let result = self.decide(criteria, cancel).await;
        let elapsed = started.elapsed();

        self.report(criteria, &result, elapsed);
        result
    }

    async fn decide(
        &self,
        criteria: &AuthCheckCriteria,
        cancel: Option<&CancellationToken>,
    ) -> Result<AuthCheckResult, AuthError> {
        criteria.validate()?;

        let call = self.pdp.check(criteria);
        let decision = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(AuthError::Cancelled),
                decision = call => decision,
            },
            None => call.await,
        }?;

        Ok(AuthCheckResult::from(decision))
    }

    fn report(
        &self,
        criteria: &AuthCheckCriteria,
        result: &Result<AuthCheckResult, AuthError>,
        elapsed: Duration,
    ) {
        match result {
            Ok(decision) => info!(
                event = "Check",
                phase = "Decision",
                subject = criteria.subject(),
                action = criteria.action(),
                resource = criteria.resource().to_string(),
                allowed = decision.allowed,
                reason = decision.reason.as_deref(),
                elapsed_ms = elapsed.as_millis() as u64
            ),
            Err(AuthError::InvalidArgument(msg)) => debug!(
                event = "Check",
                phase = "Rejected",
                error = msg.as_str()
            ),
            Err(err) => warn!(
                event = "Check",
                phase = "Failed",
                subject = criteria.subject(),
                action = criteria.action(),
                resource = criteria.resource().to_string(),
                error_kind = err.kind(),
                error = %err,
                elapsed_ms = elapsed.as_millis() as u64
            ),
        }

        self.metrics
            .on_check(&CheckStats::new(criteria, result, elapsed));
    }
}

#[async_trait]
impl AuthCheck for AuthFacade {
    async fn check(&self, criteria: &AuthCheckCriteria) -> Result<AuthCheckResult, AuthError> {
        AuthFacade::check(self, criteria).await
    }
}

#[cfg(test)]
mod tests;
