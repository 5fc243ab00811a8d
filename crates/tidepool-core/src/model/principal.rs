//! Actors and audit stamps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An actor that owns, creates, or updates catalog entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Creates a principal from a non-empty name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is empty or whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "principal name cannot be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creation and last-update stamps carried by every catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    /// When the entity was created.
    pub created_at: DateTime<Utc>,
    /// Who created the entity.
    pub created_by: Principal,
    /// When the entity was last updated.
    pub updated_at: DateTime<Utc>,
    /// Who last updated the entity.
    pub updated_by: Principal,
}

impl Audit {
    /// Stamps a freshly created entity: creation and update fields coincide.
    #[must_use]
    pub fn created(by: &Principal, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            created_by: by.clone(),
            updated_at: at,
            updated_by: by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_rejects_blank_names() {
        assert!(Principal::new("").is_err());
        assert!(Principal::new("   ").is_err());
        assert_eq!(Principal::new("Mr. Fox").unwrap().name(), "Mr. Fox");
    }

    #[test]
    fn principal_rejects_blank_names_on_deserialize() {
        let err = serde_json::from_str::<Principal>("\"\"");
        assert!(err.is_err());
        let ok: Principal = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.to_string(), "alice");
    }

    #[test]
    fn created_audit_uses_same_principal_and_instant() {
        let by = Principal::new("alice").unwrap();
        let at = DateTime::from_timestamp_millis(9).unwrap();
        let audit = Audit::created(&by, at);
        assert_eq!(audit.created_at, audit.updated_at);
        assert_eq!(audit.created_by, audit.updated_by);
    }
}
