//! Data model types for authorization checks.
//!
//! Canonical string forms:
//! - Subject: the PDP user key, e.g. `alice`
//! - Action: the action key, e.g. `read`
//! - Resource: `type:key` (e.g. `document:doc1`) or `type` alone

mod criteria;
mod resource;
mod result;

pub use criteria::AuthCheckCriteria;
pub use resource::Resource;
pub use result::{AuthCheckResult, PdpDecision};
