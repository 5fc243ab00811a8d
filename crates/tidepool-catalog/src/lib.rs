//! # tidepool-catalog
//!
//! Validating services over the catalog store.
//!
//! Each service is stateless: it validates a request, stamps audit fields with
//! the injected clock, and delegates persistence to a [`CatalogStore`] with
//! create-if-absent semantics. Uniqueness and parent existence are enforced
//! atomically by the store.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod metastore;
pub mod provider;
pub mod share;
pub mod storage;
pub mod table;
mod validation;

use std::sync::Arc;

use tidepool_core::{CatalogStore, SharedClock};

pub use error::{CatalogError, CatalogResult};
pub use metastore::{CreateMetastore, MetastoreService};
pub use provider::{CreateProvider, ProviderService};
pub use share::{AddSharedTable, CreateSchema, CreateShare, ShareService};
pub use storage::{CreateStorage, StorageService};
pub use table::{CreateInternalTable, TableService};

/// Every catalog service, sharing one store and clock.
#[derive(Clone)]
pub struct CatalogServices {
    /// Storage registration.
    pub storages: StorageService,
    /// Metastore registration.
    pub metastores: MetastoreService,
    /// Provider registration.
    pub providers: ProviderService,
    /// Internal table registration.
    pub tables: TableService,
    /// Share, schema, and shared table management.
    pub shares: ShareService,
}

impl CatalogServices {
    /// Wires every service to `store` and `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, clock: SharedClock) -> Self {
        Self {
            storages: StorageService::new(Arc::clone(&store), Arc::clone(&clock)),
            metastores: MetastoreService::new(Arc::clone(&store), Arc::clone(&clock)),
            providers: ProviderService::new(Arc::clone(&store), Arc::clone(&clock)),
            tables: TableService::new(Arc::clone(&store), Arc::clone(&clock)),
            shares: ShareService::new(store, clock),
        }
    }
}
