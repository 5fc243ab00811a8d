//! # tidepool-api
//!
//! HTTP surface for Tidepool.
//!
//! Recipients read shared tables through the Delta Sharing routes under
//! `/shares`; operators register storages, metastores, providers, tables, and
//! shares under `/admin`. Every response carries an `x-request-id` header.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod context;
pub mod error;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use router::router;
pub use server::Server;
pub use state::AppState;
