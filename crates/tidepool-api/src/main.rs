//! `tidepool-server` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::Result;

use tidepool_api::{AppState, Config, Server};
use tidepool_core::observability::{LoggingConfig, init_logging};
use tidepool_core::{MemoryCatalogStore, SystemClock};
use tidepool_sharing::TableLoaders;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_logging(&LoggingConfig::for_debug(config.debug));

    tracing::warn!("no table loaders registered; table reads will report unsupported formats");
    let state = AppState::new(
        config,
        Arc::new(MemoryCatalogStore::new()),
        Arc::new(SystemClock),
        TableLoaders::new(),
    )?;

    Server::new(state).serve().await?;
    Ok(())
}
