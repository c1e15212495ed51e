// src/lib.rs
pub use config::PermitConfig;
pub use error::AuthError;
pub use facade::AuthFacade;
pub use metrics::{CheckOutcome, CheckStats, MetricsSink};
pub use permit::PermitClient;
pub use tokio_util::sync::CancellationToken;
pub use traits::{AuthCheck, DecisionPoint, UnwiredDecisionPoint};
pub use types::{AuthCheckCriteria, AuthCheckResult, PdpDecision, Resource};

pub mod config;
mod error;
mod facade;
pub mod metrics;
mod permit;
mod traits;
mod types;
