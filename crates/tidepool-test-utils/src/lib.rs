//! Shared test utilities for Tidepool integration tests.
//!
//! This crate provides:
//! - [`MemoryTableLoader`]: a scripted, versioned table loader that records calls
//! - [`TestCatalog`]: a pre-wired store, clock, and catalog services
//! - Factory functions for catalog requests and table files
//!
//! # Example
//!
//! ```rust,ignore
//! use tidepool_test_utils::TestCatalog;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let catalog = TestCatalog::new();
//!     catalog.seed_shared_delta_table().await;
//!     let sharing = catalog.sharing_service();
//!     // ... run test ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod loader;

pub use fixtures::*;
pub use loader::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tidepool=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
