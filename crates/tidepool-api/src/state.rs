//! Shared state for request handlers.

use std::sync::Arc;

use tidepool_catalog::CatalogServices;
use tidepool_core::{CatalogStore, SharedClock};
use tidepool_sharing::{
    DeltaSharesService, SharingResult, StorageFileSignerFactory, TableLoaders,
};

use crate::config::Config;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Recipient-facing sharing reads.
    pub sharing: DeltaSharesService,
    /// Catalog management.
    pub catalog: CatalogServices,
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the sharing and catalog services to one store and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured signed URL lifetime is out of range.
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        clock: SharedClock,
        loaders: TableLoaders,
    ) -> SharingResult<Self> {
        let signers = StorageFileSignerFactory::new(Arc::clone(&clock), config.signed_url_ttl)?;
        let catalog = CatalogServices::new(store, clock);
        let sharing = DeltaSharesService::new(
            catalog.clone(),
            loaders,
            Arc::new(signers),
            config.page_limits(),
        );
        Ok(Self::from_services(config, sharing, catalog))
    }

    /// Creates state from already-built services.
    #[must_use]
    pub fn from_services(
        config: Config,
        sharing: DeltaSharesService,
        catalog: CatalogServices,
    ) -> Self {
        Self {
            sharing,
            catalog,
            config: Arc::new(config),
        }
    }
}
