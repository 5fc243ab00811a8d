//! Internal table registration under providers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidepool_core::model::{
    Audit, InternalTable, InternalTableProperties, Principal, Provider, Storage,
};
use tidepool_core::{CatalogStore, SharedClock};

use crate::error::{CatalogError, CatalogResult};
use crate::validation::{require_name, require_storage_scheme};

/// Request to register a table under a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternalTable {
    /// Table name, unique within the provider.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Format-specific coordinates.
    pub properties: InternalTableProperties,
    /// Skips the metastore requirement for Iceberg tables and location checks.
    #[serde(default)]
    pub skip_validation: bool,
}

/// Creates and looks up internal tables.
#[derive(Clone)]
pub struct TableService {
    store: Arc<dyn CatalogStore>,
    clock: SharedClock,
}

impl TableService {
    /// Creates a table service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Registers a table under `provider_name`, owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProviderNotFound`] when the provider is missing,
    /// [`CatalogError::Validation`] when an Iceberg table has no resolvable
    /// metastore (unless validation is skipped), and
    /// [`CatalogError::AlreadyExists`] when the provider already has the name.
    pub async fn create_internal_table(
        &self,
        provider_name: &str,
        request: CreateInternalTable,
        principal: &Principal,
    ) -> CatalogResult<InternalTable> {
        require_name("table", &request.name)?;
        let provider = self.require_provider(provider_name).await?;

        match &request.properties {
            InternalTableProperties::Delta { location } => {
                if location.trim().is_empty() {
                    return Err(CatalogError::validation("delta table location cannot be empty"));
                }
                if !request.skip_validation {
                    let storage = self.require_storage(&provider.storage_name).await?;
                    require_storage_scheme(
                        "delta table location",
                        storage.storage_type,
                        location,
                    )?;
                }
            }
            InternalTableProperties::Iceberg { .. } => {
                if !request.skip_validation {
                    self.require_metastore(&provider).await?;
                }
            }
        }

        let now = self.clock.now();
        let table = InternalTable {
            name: request.name,
            comment: request.comment,
            owner: principal.clone(),
            provider_name: provider.name,
            properties: request.properties,
            validated_at: Some(now),
            audit: Audit::created(principal, now),
        };
        let table = self.store.insert_table(table).await?;
        tracing::debug!(
            provider = %table.provider_name,
            table = %table.name,
            format = %table.format(),
            created_by = %principal,
            "created internal table"
        );
        Ok(table)
    }

    /// Looks up a table inside a provider.
    ///
    /// Returns `Ok(None)` when the provider exists but has no such table.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProviderNotFound`] when the provider is missing.
    pub async fn get_internal_table(
        &self,
        provider_name: &str,
        name: &str,
    ) -> CatalogResult<Option<InternalTable>> {
        self.require_provider(provider_name).await?;
        Ok(self.store.get_table(provider_name, name).await?)
    }

    async fn require_storage(&self, name: &str) -> CatalogResult<Storage> {
        self.store
            .get_storage(name)
            .await?
            .ok_or_else(|| CatalogError::StorageNotFound {
                name: name.to_string(),
            })
    }

    async fn require_provider(&self, name: &str) -> CatalogResult<Provider> {
        self.store
            .get_provider(name)
            .await?
            .ok_or_else(|| CatalogError::ProviderNotFound {
                name: name.to_string(),
            })
    }

    async fn require_metastore(&self, provider: &Provider) -> CatalogResult<()> {
        let Some(metastore) = provider.metastore_name.as_deref() else {
            return Err(CatalogError::validation(format!(
                "iceberg tables require a metastore, but provider {} has none",
                provider.name
            )));
        };
        if self.store.get_metastore(metastore).await?.is_none() {
            return Err(CatalogError::MetastoreNotFound {
                name: metastore.to_string(),
            });
        }
        Ok(())
    }
}
