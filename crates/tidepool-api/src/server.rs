//! HTTP server.

use std::net::SocketAddr;

use tidepool_core::{Error, Result};

use crate::router::router;
use crate::state::AppState;

/// The API server.
#[derive(Clone)]
pub struct Server {
    state: AppState,
}

impl Server {
    /// Creates a server over `state`.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Starts the server and blocks until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the port or fails while serving.
    pub async fn serve(&self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let app = router(self.state.clone());

        tracing::info!(addr = %addr, "starting tidepool server");

        let listener =
            tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| Error::Internal {
                    message: format!("failed to bind to {addr}: {e}"),
                })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal {
                message: format!("server error: {e}"),
            })?;

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
