//! Shares, their schemas, and the tables they expose.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidepool_core::model::{Audit, Principal, Schema, Share, SharedTable, TableReference};
use tidepool_core::{CatalogStore, SharedClock};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::validation::require_name;

/// Request to create a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShare {
    /// Unique share name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Principals the share is exposed to.
    #[serde(default)]
    pub recipients: BTreeSet<Principal>,
}

/// Request to create a schema in a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchema {
    /// Schema name, unique within the share.
    pub name: String,
}

/// Request to expose an internal table through a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSharedTable {
    /// Name recipients see, unique within the schema.
    pub name: String,
    /// Provider owning the internal table.
    pub provider_name: String,
    /// Internal table name.
    pub table_name: String,
}

/// Creates shares and populates them with schemas and tables.
#[derive(Clone)]
pub struct ShareService {
    store: Arc<dyn CatalogStore>,
    clock: SharedClock,
}

impl ShareService {
    /// Creates a share service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Creates a share owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyExists`] when the name is taken.
    pub async fn create_share(
        &self,
        request: CreateShare,
        principal: &Principal,
    ) -> CatalogResult<Share> {
        require_name("share", &request.name)?;
        let share = Share {
            name: request.name,
            id: Uuid::new_v4(),
            comment: request.comment,
            recipients: request.recipients,
            owner: principal.clone(),
            audit: Audit::created(principal, self.clock.now()),
        };
        let share = self.store.insert_share(share).await?;
        tracing::debug!(share = %share.name, id = %share.id, created_by = %principal, "created share");
        Ok(share)
    }

    /// Looks up a share by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn get_share(&self, name: &str) -> CatalogResult<Option<Share>> {
        Ok(self.store.get_share(name).await?)
    }

    /// Lists every share in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn list_shares(&self) -> CatalogResult<Vec<Share>> {
        Ok(self.store.list_shares().await?)
    }

    /// Lists the schemas of `share`, or `None` when the share is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn list_schemas(&self, share: &str) -> CatalogResult<Option<Vec<Schema>>> {
        Ok(self.store.list_schemas(share).await?)
    }

    /// Lists the tables of `share.schema`, or `None` when the schema is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn list_tables(
        &self,
        share: &str,
        schema: &str,
    ) -> CatalogResult<Option<Vec<SharedTable>>> {
        Ok(self.store.list_shared_tables(share, schema).await?)
    }

    /// Lists the tables of every schema in `share`, or `None` when the share is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn list_tables_of_share(
        &self,
        share: &str,
    ) -> CatalogResult<Option<Vec<SharedTable>>> {
        Ok(self.store.list_shared_tables_of_share(share).await?)
    }

    /// Looks up `share.schema.name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn get_shared_table(
        &self,
        share: &str,
        schema: &str,
        name: &str,
    ) -> CatalogResult<Option<SharedTable>> {
        Ok(self.store.get_shared_table(share, schema, name).await?)
    }

    /// Creates a schema in `share`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ShareNotFound`] when the share is missing and
    /// [`CatalogError::AlreadyExists`] when the share already has the schema.
    pub async fn create_schema(
        &self,
        share: &str,
        request: CreateSchema,
        principal: &Principal,
    ) -> CatalogResult<Schema> {
        require_name("schema", &request.name)?;
        let schema = self
            .store
            .insert_schema(Schema {
                name: request.name,
                share: share.to_string(),
            })
            .await?;
        tracing::debug!(share, schema = %schema.name, created_by = %principal, "created schema");
        Ok(schema)
    }

    /// Exposes an internal table as `share.schema.name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ShareNotFound`], [`CatalogError::SchemaNotFound`],
    /// [`CatalogError::ProviderNotFound`], or [`CatalogError::TableNotFound`]
    /// when a reference does not resolve, and [`CatalogError::AlreadyExists`]
    /// when the schema already has a table of that name.
    pub async fn add_table_to_schema(
        &self,
        share: &str,
        schema: &str,
        request: AddSharedTable,
        principal: &Principal,
    ) -> CatalogResult<SharedTable> {
        require_name("table", &request.name)?;
        if self.store.list_shared_tables(share, schema).await?.is_none() {
            return Err(if self.store.get_share(share).await?.is_none() {
                CatalogError::ShareNotFound {
                    name: share.to_string(),
                }
            } else {
                CatalogError::SchemaNotFound {
                    share: share.to_string(),
                    name: schema.to_string(),
                }
            });
        }
        if self.store.get_provider(&request.provider_name).await?.is_none() {
            return Err(CatalogError::ProviderNotFound {
                name: request.provider_name,
            });
        }
        if self
            .store
            .get_table(&request.provider_name, &request.table_name)
            .await?
            .is_none()
        {
            return Err(CatalogError::TableNotFound {
                provider: request.provider_name,
                name: request.table_name,
            });
        }

        let table = self
            .store
            .insert_shared_table(SharedTable {
                name: request.name,
                schema: schema.to_string(),
                share: share.to_string(),
                table: TableReference::new(request.provider_name, request.table_name),
            })
            .await?;
        tracing::debug!(
            share,
            schema,
            table = %table.name,
            backing = %table.table,
            created_by = %principal,
            "added table to schema"
        );
        Ok(table)
    }
}
