//! Client configuration for the Permit policy decision point.
//!
//! The two required settings are the API key and the PDP endpoint. Both are
//! validated once, when the configuration is built, so a façade can never
//! exist without them.
//!
//! Configuration can be built in code, deserialized (keys `apiKey`,
//! `endpoint`, `timeoutMs`, `tenant`) or read from the environment
//! (`PERMIT_API_KEY`, `PERMIT_ENDPOINT`, `PERMIT_TIMEOUT_MS`, `PERMIT_TENANT`).

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::AuthError;

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_TENANT: &str = "default";

pub const ENV_API_KEY: &str = "PERMIT_API_KEY";
pub const ENV_ENDPOINT: &str = "PERMIT_ENDPOINT";
pub const ENV_TIMEOUT_MS: &str = "PERMIT_TIMEOUT_MS";
pub const ENV_TENANT: &str = "PERMIT_TENANT";

/// Validated settings for reaching a Permit PDP.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RawPermitConfig")]
pub struct PermitConfig {
    api_key: String,
    endpoint: Url,
    timeout: Duration,
    tenant: String,
}

/// Unvalidated shape, every field optional so a missing key becomes a
/// configuration error instead of a serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct RawPermitConfig {
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
    tenant: Option<String>,
}

impl PermitConfig {
    pub fn new<K: Into<String>, E: AsRef<str>>(api_key: K, endpoint: E) -> Result<Self, AuthError> {
        RawPermitConfig {
            api_key: Some(api_key.into()),
            endpoint: Some(endpoint.as_ref().to_string()),
            ..RawPermitConfig::default()
        }
        .try_into()
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup, using the
    /// `PERMIT_*` variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms = lookup(ENV_TIMEOUT_MS)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    AuthError::Configuration(format!("{ENV_TIMEOUT_MS} is not a number: {e}"))
                })
            })
            .transpose()?;

        RawPermitConfig {
            api_key: lookup(ENV_API_KEY),
            endpoint: lookup(ENV_ENDPOINT),
            timeout_ms,
            tenant: lookup(ENV_TENANT),
        }
        .try_into()
    }

    /// Parse a JSON document shaped like `{"apiKey": "...", "endpoint": "..."}`.
    pub fn from_json_str(text: &str) -> Result<Self, AuthError> {
        serde_json::from_str::<RawPermitConfig>(text)
            .map_err(|e| AuthError::Configuration(format!("invalid config JSON: {e}")))?
            .try_into()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AuthError> {
        if timeout.is_zero() {
            return Err(AuthError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_tenant<T: Into<String>>(mut self, tenant: T) -> Result<Self, AuthError> {
        self.tenant = validate_tenant(tenant.into())?;
        Ok(self)
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// PDP base URL, always ending in `/`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tenant used when the criteria do not name one.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

impl TryFrom<RawPermitConfig> for PermitConfig {
    type Error = AuthError;

    fn try_from(raw: RawPermitConfig) -> Result<Self, Self::Error> {
        let api_key = validate_api_key(raw.api_key)?;
        let endpoint = validate_endpoint(raw.endpoint)?;

        let timeout = match raw.timeout_ms {
            Some(0) => {
                return Err(AuthError::Configuration(
                    "timeout must be greater than zero".to_string(),
                ));
            }
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        let tenant = match raw.tenant {
            Some(tenant) => validate_tenant(tenant)?,
            None => DEFAULT_TENANT.to_string(),
        };

        Ok(PermitConfig {
            api_key,
            endpoint,
            timeout,
            tenant,
        })
    }
}

impl Debug for PermitConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PermitConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("tenant", &self.tenant)
            .finish()
    }
}

fn validate_api_key(api_key: Option<String>) -> Result<String, AuthError> {
    let api_key = api_key.map(|k| k.trim().to_string()).unwrap_or_default();
    if api_key.is_empty() {
        return Err(AuthError::Configuration(
            "API key is missing or empty".to_string(),
        ));
    }
    // sent verbatim in the Authorization header
    if api_key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::Configuration(
            "API key must not contain whitespace or control characters".to_string(),
        ));
    }
    Ok(api_key)
}

fn validate_endpoint(endpoint: Option<String>) -> Result<Url, AuthError> {
    let endpoint = endpoint.map(|e| e.trim().to_string()).unwrap_or_default();
    if endpoint.is_empty() {
        return Err(AuthError::Configuration(
            "endpoint is missing or empty".to_string(),
        ));
    }

    let mut url = Url::parse(&endpoint)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::Configuration(format!(
            "endpoint scheme must be http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(AuthError::Configuration(format!(
            "endpoint '{endpoint}' has no host"
        )));
    }

    // Url::join replaces the last segment unless the path ends in a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn validate_tenant(tenant: String) -> Result<String, AuthError> {
    let tenant = tenant.trim().to_string();
    if tenant.is_empty() {
        return Err(AuthError::Configuration(
            "tenant must not be empty".to_string(),
        ));
    }
    Ok(tenant)
}
