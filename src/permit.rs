//! HTTP client for a Permit.io policy decision point.
//!
//! Talks to either the Permit cloud PDP or a PDP container running locally
//! (usually `http://localhost:7766`). A single check is one
//! `POST {endpoint}/allowed` request:
//!
//! ```text
//! {"user": {"key": "alice"},
//!  "action": "read",
//!  "resource": {"type": "document", "key": "doc1", "tenant": "default"},
//!  "context": {}}
//! ```
//!
//! answered by `{"allow": true, ...}`.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::PermitConfig;
use crate::error::AuthError;
use crate::traits::DecisionPoint;
use crate::types::{AuthCheckCriteria, PdpDecision};

const ALLOWED_PATH: &str = "allowed";
const USER_AGENT: &str = concat!("permit-authz/", env!("CARGO_PKG_VERSION"));
/// Longest error body carried into an `AuthError` message or a log line.
const MAX_DETAIL_BYTES: usize = 512;

#[derive(Debug, Serialize)]
struct AllowedRequest<'a> {
    user: UserRef<'a>,
    action: &'a str,
    resource: ResourceRef<'a>,
    context: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct UserRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct ResourceRef<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
    tenant: &'a str,
}

impl<'a> AllowedRequest<'a> {
    fn new(criteria: &'a AuthCheckCriteria, default_tenant: &'a str) -> Self {
        AllowedRequest {
            user: UserRef {
                key: criteria.subject(),
            },
            action: criteria.action(),
            resource: ResourceRef {
                kind: criteria.resource().kind(),
                key: criteria.resource().key(),
                tenant: criteria.tenant().unwrap_or(default_tenant),
            },
            context: Map::new(),
        }
    }
}

/// Shared handle to a Permit PDP. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone)]
pub struct PermitClient {
    http: Client,
    allowed_url: Url,
    api_key: String,
    tenant: String,
}

impl Debug for PermitClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PermitClient")
            .field("allowed_url", &self.allowed_url.as_str())
            .field("tenant", &self.tenant)
            .finish_non_exhaustive()
    }
}

impl PermitClient {
    pub fn new(config: &PermitConfig) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            // 3xx surfaces as UnexpectedResponse, never followed
            .redirect(Policy::none())
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(PermitClient {
            http,
            allowed_url: config.endpoint().join(ALLOWED_PATH)?,
            api_key: config.api_key().to_string(),
            tenant: config.tenant().to_string(),
        })
    }

    pub fn allowed_url(&self) -> &Url {
        &self.allowed_url
    }
}

#[async_trait]
impl DecisionPoint for PermitClient {
    async fn check(&self, criteria: &AuthCheckCriteria) -> Result<PdpDecision, AuthError> {
        let body = AllowedRequest::new(criteria, &self.tenant);

        debug!(
            event = "Check",
            phase = "Dispatch",
            url = self.allowed_url.as_str(),
            tenant = body.resource.tenant
        );

        let response = self
            .http
            .post(self.allowed_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_detail(response).await;
            warn!(
                event = "Check",
                phase = "Response",
                status = status.as_u16(),
                detail = detail.as_str()
            );
            return Err(status_error(status, &detail));
        }

        let mut decision: PdpDecision = response.json().await?;
        if decision.reason.is_none() {
            decision.reason = debug_reason(decision.debug.as_ref());
        }
        Ok(decision)
    }

    fn name(&self) -> &'static str {
        "permit"
    }
}

fn status_error(status: StatusCode, detail: &str) -> AuthError {
    let message = if detail.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), detail)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthError::AuthenticationFailed(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            AuthError::UnreachableService(message)
        }
        s if s.is_server_error() => AuthError::UnreachableService(message),
        _ => AuthError::UnexpectedResponse(message),
    }
}

/// Read at most `MAX_DETAIL_BYTES` (plus one chunk) of an error body.
async fn read_detail(mut response: Response) -> String {
    let mut body = Vec::new();
    while body.len() <= MAX_DETAIL_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(err) => return format!("<unreadable body: {err}>"),
        }
    }
    truncate_detail(&body)
}

fn truncate_detail(body: &[u8]) -> String {
    if body.len() <= MAX_DETAIL_BYTES {
        return String::from_utf8_lossy(body).into_owned();
    }
    let mut detail = String::from_utf8_lossy(&body[..MAX_DETAIL_BYTES]).into_owned();
    // a multi-byte char cut at the limit decodes as U+FFFD
    if detail.ends_with(char::REPLACEMENT_CHARACTER) {
        detail.pop();
    }
    detail.push_str("...");
    detail
}

fn debug_reason(debug: Option<&Value>) -> Option<String> {
    debug?
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
}
