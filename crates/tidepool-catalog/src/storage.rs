//! Storage registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidepool_core::model::{Audit, Principal, Storage, StorageProperties, StorageType};
use tidepool_core::{CatalogStore, SharedClock};

use crate::error::{CatalogError, CatalogResult};
use crate::validation::{require_name, require_storage_scheme, uri_scheme};

/// Request to register a storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStorage {
    /// Unique storage name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Declared backend kind.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Root location URI.
    pub uri: String,
    /// Backend properties; must match `storage_type`.
    pub properties: StorageProperties,
    /// Skips checks that depend on the location's shape.
    #[serde(default)]
    pub skip_validation: bool,
}

/// Creates and looks up storage registrations.
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn CatalogStore>,
    clock: SharedClock,
}

impl StorageService {
    /// Creates a storage service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Registers a storage owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when the properties do not match the
    /// declared type or the URI is unusable, and [`CatalogError::AlreadyExists`]
    /// when the name is taken.
    pub async fn create_storage(
        &self,
        request: CreateStorage,
        principal: &Principal,
    ) -> CatalogResult<Storage> {
        require_name("storage", &request.name)?;
        if request.properties.storage_type() != request.storage_type {
            return Err(CatalogError::validation(format!(
                "storage type {} does not match {} properties",
                request.storage_type,
                request.properties.storage_type()
            )));
        }
        if request.skip_validation {
            uri_scheme("storage uri", &request.uri)?;
        } else {
            require_storage_scheme("storage uri", request.storage_type, &request.uri)?;
        }

        let now = self.clock.now();
        let storage = Storage {
            name: request.name,
            comment: request.comment,
            owner: principal.clone(),
            storage_type: request.storage_type,
            uri: request.uri,
            properties: request.properties,
            validated_at: Some(now),
            audit: Audit::created(principal, now),
        };
        let storage = self.store.insert_storage(storage).await?;
        tracing::debug!(
            storage = %storage.name,
            storage_type = %storage.storage_type,
            created_by = %principal,
            "created storage"
        );
        Ok(storage)
    }

    /// Looks up a storage by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn get_storage(&self, name: &str) -> CatalogResult<Option<Storage>> {
        Ok(self.store.get_storage(name).await?)
    }
}
