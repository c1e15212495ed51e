use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use thiserror::Error;

/// Every failure an authorization check can surface.
///
/// None of these may be read as a decision. Callers treat any error as
/// "decision unavailable", never as an implicit allow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("authorization service unreachable: {0}")]
    UnreachableService(String),

    #[error("authorization service rejected the API key: {0}")]
    AuthenticationFailed(String),

    #[error("unexpected response from authorization service: {0}")]
    UnexpectedResponse(String),

    #[error("authorization check cancelled")]
    Cancelled,

    #[error("authorization check is not implemented")]
    NotImplemented,
}

impl AuthError {
    /// Stable snake_case name of the variant, used in logs and metrics.
    pub fn kind(&self) -> &str {
        self.as_ref()
    }

    /// True for failures that may succeed if the caller tries again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::UnreachableService(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            AuthError::Configuration(err.to_string())
        } else if err.is_decode() {
            AuthError::UnexpectedResponse(err.to_string())
        } else {
            // connect, timeout, request and body errors all mean the PDP
            // could not be reached or did not finish answering
            AuthError::UnreachableService(err.to_string())
        }
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::Configuration(format!("invalid endpoint: {err}"))
    }
}
