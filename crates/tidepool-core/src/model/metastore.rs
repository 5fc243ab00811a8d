//! External catalog (metastore) registrations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::principal::{Audit, Principal};
use super::storage::AwsCredentials;
use crate::error::{Error, Result};

/// Kind of external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetastoreType {
    /// AWS Glue Data Catalog.
    Glue,
    /// Hadoop catalog rooted at a warehouse location.
    Hadoop,
}

impl MetastoreType {
    /// Parses a metastore type using case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `raw` is unknown or empty.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "glue" => Ok(Self::Glue),
            "hadoop" => Ok(Self::Hadoop),
            other => Err(Error::InvalidInput(format!(
                "unknown metastore type '{other}'; expected one of: glue, hadoop"
            ))),
        }
    }

    /// Returns the canonical lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glue => "glue",
            Self::Hadoop => "hadoop",
        }
    }
}

impl fmt::Display for MetastoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog-specific metastore properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetastoreProperties {
    /// Glue catalog coordinates.
    #[serde(rename_all = "camelCase")]
    Glue {
        /// Glue catalog id (AWS account id).
        catalog_id: String,
        /// Credentials for the Glue API.
        credentials: AwsCredentials,
    },
    /// Hadoop catalog warehouse.
    Hadoop {
        /// Warehouse location URI.
        location: String,
    },
}

impl MetastoreProperties {
    /// Returns the metastore type these properties configure.
    #[must_use]
    pub const fn metastore_type(&self) -> MetastoreType {
        match self {
            Self::Glue { .. } => MetastoreType::Glue,
            Self::Hadoop { .. } => MetastoreType::Hadoop,
        }
    }
}

/// A registered external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metastore {
    /// Unique metastore name.
    pub name: String,
    /// Optional free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Owner of the registration.
    pub owner: Principal,
    /// Catalog kind.
    #[serde(rename = "type")]
    pub metastore_type: MetastoreType,
    /// Catalog properties; the variant always matches `metastore_type`.
    pub properties: MetastoreProperties,
    /// When the registration was last validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    /// Creation and update stamps.
    #[serde(flatten)]
    pub audit: Audit,
}
