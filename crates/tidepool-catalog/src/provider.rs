//! Provider registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidepool_core::model::{Audit, Principal, Provider};
use tidepool_core::{CatalogStore, SharedClock};

use crate::error::CatalogResult;
use crate::validation::require_name;

/// Request to register a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProvider {
    /// Unique provider name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Backing storage name.
    pub storage_name: String,
    /// Backing metastore name, if any.
    #[serde(default)]
    pub metastore_name: Option<String>,
}

/// Creates and looks up providers.
#[derive(Clone)]
pub struct ProviderService {
    store: Arc<dyn CatalogStore>,
    clock: SharedClock,
}

impl ProviderService {
    /// Creates a provider service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Registers a provider owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CatalogError::StorageNotFound`] or
    /// [`crate::CatalogError::MetastoreNotFound`] when a reference does not
    /// resolve, and [`crate::CatalogError::AlreadyExists`] when the name is taken.
    pub async fn create_provider(
        &self,
        request: CreateProvider,
        principal: &Principal,
    ) -> CatalogResult<Provider> {
        require_name("provider", &request.name)?;
        let now = self.clock.now();
        let provider = Provider {
            name: request.name,
            comment: request.comment,
            owner: principal.clone(),
            storage_name: request.storage_name,
            metastore_name: request.metastore_name,
            audit: Audit::created(principal, now),
        };
        let provider = self.store.insert_provider(provider).await?;
        tracing::debug!(
            provider = %provider.name,
            storage = %provider.storage_name,
            metastore = ?provider.metastore_name,
            created_by = %principal,
            "created provider"
        );
        Ok(provider)
    }

    /// Looks up a provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CatalogError::Store`] when the catalog cannot be read.
    pub async fn get_provider(&self, name: &str) -> CatalogResult<Option<Provider>> {
        Ok(self.store.get_provider(name).await?)
    }
}
