//! Object-storage registrations and their credential variants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::principal::{Audit, Principal};
use crate::error::{Error, Result};

/// Backend kind of a registered storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Amazon S3 (and S3-compatible endpoints).
    S3,
    /// Google Cloud Storage.
    Gcs,
    /// Azure Blob File System.
    Abfs,
}

impl StorageType {
    /// Parses a storage type using case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `raw` is unknown or empty.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "gcs" => Ok(Self::Gcs),
            "abfs" => Ok(Self::Abfs),
            other => Err(Error::InvalidInput(format!(
                "unknown storage type '{other}'; expected one of: s3, gcs, abfs"
            ))),
        }
    }

    /// Returns the canonical lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::Abfs => "abfs",
        }
    }

    /// URI schemes accepted for locations of this storage type.
    #[must_use]
    pub const fn uri_schemes(self) -> &'static [&'static str] {
        match self {
            Self::S3 => &["s3", "s3a", "s3n"],
            Self::Gcs => &["gs"],
            Self::Abfs => &["abfs", "abfss"],
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AWS credentials used for S3 storage and Glue metastores.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "credentialsType", rename_all = "camelCase")]
pub enum AwsCredentials {
    /// Static access key pair bound to a region.
    Simple(SimpleAwsCredentials),
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(creds) => f.debug_tuple("Simple").field(creds).finish(),
        }
    }
}

/// A static AWS access key pair and its signing region.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleAwsCredentials {
    /// Access key id.
    pub aws_access_key_id: String,
    /// Secret access key.
    pub aws_secret_access_key: String,
    /// Signing region (e.g. `us-east-1`).
    pub region: String,
}

impl SimpleAwsCredentials {
    /// Creates a credential triple.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            aws_access_key_id: access_key_id.into(),
            aws_secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }
}

impl fmt::Debug for SimpleAwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAwsCredentials")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

/// S3 access configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Properties {
    /// Credentials used to sign requests.
    pub credentials: AwsCredentials,
    /// Optional custom endpoint (S3-compatible stores); forces path-style URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// GCS access configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsProperties {
    /// Service account key (JSON).
    pub service_account_key: String,
}

impl fmt::Debug for GcsProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsProperties")
            .field("service_account_key", &"[REDACTED]")
            .finish()
    }
}

/// ABFS access configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbfsProperties {
    /// Storage account name.
    pub account_name: String,
    /// Storage account key.
    pub account_key: String,
}

impl fmt::Debug for AbfsProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbfsProperties")
            .field("account_name", &self.account_name)
            .field("account_key", &"[REDACTED]")
            .finish()
    }
}

/// Backend-specific storage properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageProperties {
    /// S3 properties.
    S3(S3Properties),
    /// GCS properties.
    Gcs(GcsProperties),
    /// ABFS properties.
    Abfs(AbfsProperties),
}

impl StorageProperties {
    /// Returns the storage type these properties configure.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        match self {
            Self::S3(_) => StorageType::S3,
            Self::Gcs(_) => StorageType::Gcs,
            Self::Abfs(_) => StorageType::Abfs,
        }
    }
}

/// A registered object-storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    /// Unique storage name.
    pub name: String,
    /// Optional free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Owner of the registration.
    pub owner: Principal,
    /// Backend kind.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Root location URI.
    pub uri: String,
    /// Backend properties; the variant always matches `storage_type`.
    pub properties: StorageProperties,
    /// When the registration was last validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    /// Creation and update stamps.
    #[serde(flatten)]
    pub audit: Audit,
}
