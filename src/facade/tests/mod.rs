use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::metrics::CheckOutcome;
use crate::types::PdpDecision;
use yare::parameterized;


const ENDPOINT: &str = "http://localhost:7766";

/// In-memory PDP: allows exactly the listed (subject, action, resource) triples.
#[derive(Default)]
struct FakePdp {
    grants: HashMap<(String, String, String), Option<String>>,
    failure: Option<AuthError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakePdp {
    fn allowing(grants: &[(&str, &str, &str)]) -> Self {
        FakePdp {
            grants: grants
                .iter()
                .map(|(s, a, r)| ((s.to_string(), a.to_string(), r.to_string()), None))
                .collect(),
            ..FakePdp::default()
        }
    }

    fn failing(err: AuthError) -> Self {
        FakePdp {
            failure: Some(err),
            ..FakePdp::default()
        }
    }

    fn with_reason(mut self, subject: &str, action: &str, resource: &str, reason: &str) -> Self {
        self.grants.insert(
            (subject.to_string(), action.to_string(), resource.to_string()),
            Some(reason.to_string()),
        );
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionPoint for FakePdp {
    async fn check(
        &self,
        criteria: &AuthCheckCriteria,
    ) -> Result<PdpDecision, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let key = (
            criteria.subject().to_string(),
            criteria.action().to_string(),
            criteria.resource().to_string(),
        );
        Ok(match self.grants.get(&key) {
            Some(reason) => PdpDecision {
                allow: true,
                reason: reason.clone(),
                debug: None,
            },
            None => PdpDecision::default(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct RecordingSink {
    stats: Mutex<Vec<CheckStats>>,
}

impl RecordingSink {
    fn outcomes(&self) -> Vec<(CheckOutcome, Option<String>)> {
        self.stats
            .lock()
            .unwrap()
            .iter()
            .map(|s| (s.outcome, s.error_kind.clone()))
            .collect()
    }
}

impl MetricsSink for RecordingSink {
    fn on_check(&self, stats: &CheckStats) {
        self.stats.lock().unwrap().push(stats.clone());
    }
}

fn facade_with(pdp: FakePdp) -> (AuthFacade, Arc<FakePdp>) {
    let pdp = Arc::new(pdp);
    (AuthFacade::with_decision_point(pdp.clone()), pdp)
}

fn valid_config() -> PermitConfig {
    PermitConfig::new("permit_key_123", ENDPOINT).unwrap()
}

#[parameterized(
    empty_api_key = { "", ENDPOINT },
    blank_api_key = { "   ", ENDPOINT },
    empty_endpoint = { "permit_key_123", "" },
    blank_endpoint = { "permit_key_123", " " },
)]
fn test_construction_requires_configuration(api_key: &str, endpoint: &str) {
    let result = PermitConfig::new(api_key, endpoint).and_then(|config| AuthFacade::new(&config));
    assert!(matches!(result, Err(AuthError::Configuration(_))));
}

#[test]
fn test_construction_with_valid_configuration() {
    let facade = AuthFacade::new(&valid_config()).unwrap();
    assert_eq!(facade.decision_point_name(), "permit");
}

#[tokio::test]
async fn test_allowed_decision_is_returned() {
    let (facade, pdp) = facade_with(FakePdp::allowing(&[("alice", "read", "doc1")]));

    let result = facade
        .check(&AuthCheckCriteria::new("alice", "read", "doc1"))
        .await
        .unwrap();

    assert!(result.allowed);
    assert_eq!(pdp.calls(), 1);
}

#[parameterized(
    other_subject = { "bob", "read", "doc1" },
    other_action = { "alice", "write", "doc1" },
    other_resource = { "alice", "read", "doc2" },
)]
#[test_macro(tokio::test)]
async fn test_denied_decision_is_not_an_error(subject: &str, action: &str, resource: &str) {
    let (facade, _) = facade_with(FakePdp::allowing(&[("alice", "read", "doc1")]));

    let result = facade
        .check(&AuthCheckCriteria::new(subject, action, resource))
        .await
        .unwrap();

    assert!(!result.allowed);
    assert_eq!(result.reason, None);
}

#[tokio::test]
async fn test_reason_is_carried_through() {
    let (facade, _) = facade_with(FakePdp::default().with_reason(
        "alice",
        "edit",
        "photo:VacationPhoto94.jpg",
        "alice owns the photo",
    ));

    let result = facade
        .check(&AuthCheckCriteria::new(
            "alice",
            "edit",
            "photo:VacationPhoto94.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(result.to_string(), "Allow(alice owns the photo)");
}

#[parameterized(
    missing_subject = { "", "read", "doc1" },
    missing_action = { "alice", "", "doc1" },
    missing_resource = { "alice", "read", "" },
    blank_everything = { " ", " ", " " },
    missing_resource_key = { "alice", "read", "document:" },
)]
#[test_macro(tokio::test)]
async fn test_invalid_criteria_never_reach_the_pdp(subject: &str, action: &str, resource: &str) {
    let (facade, pdp) = facade_with(FakePdp::allowing(&[("alice", "read", "doc1")]));

    let err = facade
        .check(&AuthCheckCriteria::new(subject, action, resource))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidArgument(_)), "{err:?}");
    assert_eq!(pdp.calls(), 0);
}

#[parameterized(
    alice_read = { "alice", "read", "doc1" },
    bob_delete = { "bob", "delete", "photo:VacationPhoto94.jpg" },
    type_only = { "charlie", "list", "document" },
)]
#[test_macro(tokio::test)]
async fn test_unwired_facade_is_not_implemented(subject: &str, action: &str, resource: &str) {
    let facade = AuthFacade::unwired(&valid_config());

    let result = facade
        .check(&AuthCheckCriteria::new(subject, action, resource))
        .await;

    assert_eq!(result, Err(AuthError::NotImplemented));
    assert_eq!(facade.decision_point_name(), "unwired");
}

#[tokio::test]
async fn test_unwired_facade_still_validates_criteria() {
    let facade = AuthFacade::unwired(&valid_config());
    let result = facade.check(&AuthCheckCriteria::new("", "read", "doc1")).await;
    assert!(matches!(result, Err(AuthError::InvalidArgument(_))));
}

#[parameterized(
    unreachable = { AuthError::UnreachableService("connection refused".into()) },
    bad_key = { AuthError::AuthenticationFailed("HTTP 401".into()) },
    garbage = { AuthError::UnexpectedResponse("HTTP 404".into()) },
)]
#[test_macro(tokio::test)]
async fn test_pdp_errors_are_surfaced_unchanged(failure: AuthError) {
    let (facade, pdp) = facade_with(FakePdp::failing(failure.clone()));

    let result = facade
        .check(&AuthCheckCriteria::new("alice", "read", "doc1"))
        .await;

    assert_eq!(result, Err(failure));
    assert_eq!(pdp.calls(), 1);
}

#[tokio::test]
async fn test_facade_through_auth_check_trait() {
    let (facade, _) = facade_with(FakePdp::allowing(&[("alice", "read", "doc1")]));
    let contract: Arc<dyn AuthCheck> = Arc::new(facade);

    let result = contract
        .check(&AuthCheckCriteria::new("alice", "read", "doc1"))
        .await
        .unwrap();

    assert!(result.is_allowed());
}

#[tokio::test]
async fn test_metrics_sink_sees_every_outcome() {
    let sink = Arc::new(RecordingSink::default());
    let (facade, _) = facade_with(FakePdp::allowing(&[("alice", "read", "doc1")]));
    let facade = facade.with_metrics_sink(sink.clone());

    let _ = facade.check(&AuthCheckCriteria::new("alice", "read", "doc1")).await;
    let _ = facade.check(&AuthCheckCriteria::new("bob", "read", "doc1")).await;
    let _ = facade.check(&AuthCheckCriteria::new("", "read", "doc1")).await;

    assert_eq!(
        sink.outcomes(),
        vec![
            (CheckOutcome::Allowed, None),
            (CheckOutcome::Denied, None),
            (CheckOutcome::Failed, Some("invalid_argument".to_string())),
        ]
    );

    let stats = sink.stats.lock().unwrap();
    assert_eq!(stats[0].subject, "alice");
    assert_eq!(stats[0].resource, "doc1");
}

#[tokio::test]
async fn test_metrics_record_pdp_round_trip_time() {
    let sink = Arc::new(RecordingSink::default());
    let (facade, _) = facade_with(
        FakePdp::allowing(&[("alice", "read", "doc1")]).with_delay(Duration::from_millis(20)),
    );
    let facade = facade.with_metrics_sink(sink.clone());

    facade
        .check(&AuthCheckCriteria::new("alice", "read", "doc1"))
        .await
        .unwrap();

    let stats = sink.stats.lock().unwrap();
    assert!(stats[0].duration >= Duration::from_millis(20));
}
