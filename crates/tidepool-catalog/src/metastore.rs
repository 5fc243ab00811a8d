//! Metastore registration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tidepool_core::model::{Audit, Metastore, MetastoreProperties, MetastoreType, Principal};
use tidepool_core::{CatalogStore, SharedClock};

use crate::error::{CatalogError, CatalogResult};
use crate::validation::{require_name, uri_scheme};

/// Request to register an external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetastore {
    /// Unique metastore name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Declared catalog kind.
    #[serde(rename = "type")]
    pub metastore_type: MetastoreType,
    /// Catalog properties; must match `metastore_type`.
    pub properties: MetastoreProperties,
    /// Skips checks that depend on the catalog's coordinates.
    #[serde(default)]
    pub skip_validation: bool,
}

/// Creates and looks up metastore registrations.
#[derive(Clone)]
pub struct MetastoreService {
    store: Arc<dyn CatalogStore>,
    clock: SharedClock,
}

impl MetastoreService {
    /// Creates a metastore service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Registers a metastore owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when the properties do not match the
    /// declared type, and [`CatalogError::AlreadyExists`] when the name is taken.
    pub async fn create_metastore(
        &self,
        request: CreateMetastore,
        principal: &Principal,
    ) -> CatalogResult<Metastore> {
        require_name("metastore", &request.name)?;
        if request.properties.metastore_type() != request.metastore_type {
            return Err(CatalogError::validation(format!(
                "metastore type {} does not match {} properties",
                request.metastore_type,
                request.properties.metastore_type()
            )));
        }
        if let MetastoreProperties::Hadoop { location } = &request.properties {
            if !request.skip_validation {
                uri_scheme("hadoop warehouse location", location)?;
            }
        }

        let now = self.clock.now();
        let metastore = Metastore {
            name: request.name,
            comment: request.comment,
            owner: principal.clone(),
            metastore_type: request.metastore_type,
            properties: request.properties,
            validated_at: Some(now),
            audit: Audit::created(principal, now),
        };
        let metastore = self.store.insert_metastore(metastore).await?;
        tracing::debug!(
            metastore = %metastore.name,
            metastore_type = %metastore.metastore_type,
            created_by = %principal,
            "created metastore"
        );
        Ok(metastore)
    }

    /// Looks up a metastore by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the catalog cannot be read.
    pub async fn get_metastore(&self, name: &str) -> CatalogResult<Option<Metastore>> {
        Ok(self.store.get_metastore(name).await?)
    }
}
