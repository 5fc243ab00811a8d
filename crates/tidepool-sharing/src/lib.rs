//! # tidepool-sharing
//!
//! Delta Sharing reads over the share catalog.
//!
//! [`DeltaSharesService`] resolves a shared table to its backing table,
//! validates the [`QueryRequest`] before touching any table data, asks the
//! [`TableLoader`] registered for the table's format for a versioned
//! snapshot, prunes files with the predicate hint, and signs every surviving
//! file with a [`FileSigner`] built for the provider's storage.
//!
//! ## Example
//!
//! ```rust
//! use tidepool_sharing::{QueryRequest, ReadMode};
//!
//! let request: QueryRequest = serde_json::from_str(r#"{"version": 3}"#).unwrap();
//! assert_eq!(request.resolve().unwrap().mode, ReadMode::Version(3));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod loader;
pub mod request;
pub mod service;
pub mod signer;
pub mod version;

pub use error::{SharingError, SharingResult};
pub use loader::{ResolvedTable, SnapshotRead, TableLoader, TableLoaders, TableSnapshot};
pub use request::{QueryRequest, ReadTableRequest};
pub use service::{DeltaSharesService, ReadTableResult, TableMetadata};
pub use signer::{
    DEFAULT_SIGNED_URL_TTL, FileSigner, FileSignerFactory, MAX_SIGNED_URL_TTL, S3FileSigner,
    StorageFileSignerFactory,
};
pub use version::{ReadMode, TableCommit, parse_timestamp, resolve_version};
