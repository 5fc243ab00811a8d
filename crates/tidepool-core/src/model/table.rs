//! Tables registered under a provider.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::principal::{Audit, Principal};
use crate::error::{Error, Result};

/// Supported table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Delta Lake table.
    Delta,
    /// Apache Iceberg table.
    Iceberg,
}

impl TableFormat {
    /// Parses a table format using case-insensitive matching.
    ///
    /// Accepted values: `delta`, `iceberg` (any casing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `raw` is unknown or empty.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "delta" => Ok(Self::Delta),
            "iceberg" => Ok(Self::Iceberg),
            other => Err(Error::InvalidInput(format!(
                "unknown table format '{other}'; expected one of: delta, iceberg"
            ))),
        }
    }

    /// Returns the canonical lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Iceberg => "iceberg",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format-specific coordinates of an internal table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InternalTableProperties {
    /// A Delta table rooted at a storage location.
    Delta {
        /// Table root URI.
        location: String,
    },
    /// An Iceberg table resolved through the provider's metastore.
    #[serde(rename_all = "camelCase")]
    Iceberg {
        /// Metastore database (namespace).
        database_name: String,
        /// Table name inside the database.
        table_name: String,
    },
}

impl InternalTableProperties {
    /// Returns the table format these properties describe.
    #[must_use]
    pub const fn format(&self) -> TableFormat {
        match self {
            Self::Delta { .. } => TableFormat::Delta,
            Self::Iceberg { .. } => TableFormat::Iceberg,
        }
    }
}

/// A table registered under a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalTable {
    /// Table name, unique within its provider.
    pub name: String,
    /// Optional free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Owner of the table registration.
    pub owner: Principal,
    /// Name of the owning provider.
    pub provider_name: String,
    /// Format-specific coordinates.
    pub properties: InternalTableProperties,
    /// When the registration was last validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    /// Creation and update stamps.
    #[serde(flatten)]
    pub audit: Audit,
}

impl InternalTable {
    /// Returns the table format.
    #[must_use]
    pub const fn format(&self) -> TableFormat {
        self.properties.format()
    }
}

/// Reference from a shared table to the internal table backing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    /// Owning provider name.
    pub provider_name: String,
    /// Internal table name.
    pub table_name: String,
}

impl TableReference {
    /// Creates a reference to `provider.table`.
    #[must_use]
    pub fn new(provider_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.provider_name, self.table_name)
    }
}
