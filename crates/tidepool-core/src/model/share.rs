//! The Share → Schema → `SharedTable` hierarchy exposed to recipients.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::principal::{Audit, Principal};
use super::table::TableReference;

/// A named grouping of schemas exposed to recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    /// Unique share name.
    pub name: String,
    /// Generated at creation.
    pub id: Uuid,
    /// Optional free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Principals the share is exposed to.
    #[serde(default)]
    pub recipients: BTreeSet<Principal>,
    /// Owner of the share.
    pub owner: Principal,
    /// Creation and update stamps.
    #[serde(flatten)]
    pub audit: Audit,
}

/// A named grouping of shared tables inside a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name, unique within its share.
    pub name: String,
    /// Owning share name.
    pub share: String,
}

/// A table exposed through a share's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTable {
    /// Table name, unique within its schema.
    pub name: String,
    /// Owning schema name.
    pub schema: String,
    /// Owning share name.
    pub share: String,
    /// The internal table served for this name.
    pub table: TableReference,
}
