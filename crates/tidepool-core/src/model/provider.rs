//! Providers bind a storage and an optional metastore under one name.

use serde::{Deserialize, Serialize};

use super::principal::{Audit, Principal};

/// A named binding of storage (and optionally a metastore) owning tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Unique provider name.
    pub name: String,
    /// Optional free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Owner of the provider.
    pub owner: Principal,
    /// Name of the backing storage registration.
    pub storage_name: String,
    /// Name of the backing metastore registration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metastore_name: Option<String>,
    /// Creation and update stamps.
    #[serde(flatten)]
    pub audit: Audit,
}
