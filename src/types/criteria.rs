//! Authorization check criteria.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AuthError;

use super::resource::Resource;

/// Who wants to perform which action on what resource.
///
/// Fields are read-only after construction. Construction does not validate;
/// [`AuthCheckCriteria::validate`] runs before any check reaches the PDP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct AuthCheckCriteria {
    subject: String,
    action: String,
    resource: Resource,
    /// Tenant the resource lives in; the configured tenant is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

impl AuthCheckCriteria {
    pub fn new<S, A, R>(subject: S, action: A, resource: R) -> Self
    where
        S: Into<String>,
        A: Into<String>,
        R: Into<Resource>,
    {
        AuthCheckCriteria {
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
            tenant: None,
        }
    }

    #[must_use]
    pub fn with_tenant<T: Into<String>>(mut self, tenant: T) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Reject criteria missing a subject, action or resource.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.subject.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "subject must not be empty".to_string(),
            ));
        }
        if self.action.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "action must not be empty".to_string(),
            ));
        }
        self.resource.validate()?;
        if let Some(tenant) = &self.tenant
            && tenant.trim().is_empty()
        {
            return Err(AuthError::InvalidArgument(
                "tenant must not be empty when given".to_string(),
            ));
        }
        Ok(())
    }
}

impl Display for AuthCheckCriteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} -> {} -> {}", self.subject, self.action, self.resource)
    }
}
