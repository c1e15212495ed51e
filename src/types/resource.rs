//! Resource identifiers in the `type[:key]` form.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AuthError;

/// The resource a check is about, e.g. `document:doc1` or `document`.
///
/// A resource without a key stands for any instance of its type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct Resource {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl Resource {
    pub fn new<K: Into<String>, I: Into<String>>(kind: K, key: I) -> Self {
        Resource {
            kind: kind.into(),
            key: Some(key.into()),
        }
    }

    /// A resource naming only a type.
    pub fn of_kind<K: Into<String>>(kind: K) -> Self {
        Resource {
            kind: kind.into(),
            key: None,
        }
    }

    /// Split at the first `:`. Never fails; emptiness is checked by `validate`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((kind, key)) => Resource::new(kind, key),
            None => Resource::of_kind(s),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.kind.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "resource type must not be empty".to_string(),
            ));
        }
        if let Some(key) = &self.key
            && key.trim().is_empty()
        {
            return Err(AuthError::InvalidArgument(format!(
                "resource key for '{}' must not be empty when given",
                self.kind
            )));
        }
        Ok(())
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.key {
            Some(key) => write!(f, "{}:{}", self.kind, key),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for Resource {
    type Err = AuthError;

    /// Like [`Resource::parse`], but rejects empty parts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let resource = Resource::parse(s);
        resource.validate()?;
        Ok(resource)
    }
}

impl From<&str> for Resource {
    fn from(s: &str) -> Self {
        Resource::parse(s)
    }
}

impl From<String> for Resource {
    fn from(s: String) -> Self {
        Resource::parse(&s)
    }
}
