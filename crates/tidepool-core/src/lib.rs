//! # tidepool-core
//!
//! Core abstractions for the Tidepool data-sharing control plane.
//!
//! This crate provides the foundational types and traits used across all
//! Tidepool components:
//!
//! - **Catalog Entities**: storages, metastores, providers, tables, and the
//!   share/schema/table hierarchy exposed to recipients
//! - **Snapshot Records**: protocol, metadata, and data files produced per query
//! - **Pagination**: opaque continuation tokens over stable lists
//! - **Catalog Store**: the persistence capability with create-if-absent semantics
//! - **Clock**: injectable time source for audit stamps and expirations
//! - **Error Types**: shared error definitions and result types
//!
//! ## Example
//!
//! ```rust
//! use tidepool_core::prelude::*;
//!
//! let page = paginate(vec!["a", "b", "c"], PageRequest::new(0, 2));
//! assert_eq!(page.content, vec!["a", "b"]);
//! assert_eq!(page.token.map(PageToken::encode).as_deref(), Some("2"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod clock;
pub mod error;
pub mod model;
pub mod observability;
pub mod pagination;
pub mod store;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use error::{Error, Result};
pub use store::{CatalogStore, MemoryCatalogStore};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, FixedClock, SharedClock, SystemClock};
    pub use crate::error::{Error, Result};
    pub use crate::model::*;
    pub use crate::pagination::{
        ContentAndToken, PageLimits, PageRequest, PageToken, paginate,
    };
    pub use crate::store::{CatalogStore, MemoryCatalogStore};
}
