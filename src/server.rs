//! Server assembly and lifecycle.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::router::{build_router, AppState};
use crate::spec::SpecDocument;
use crate::store::ObjectStore;

/// The assembled mock API server.
///
/// The dataset and OpenAPI document are loaded once at construction; a load
/// failure is fatal so the server never serves traffic with a corrupt
/// dataset. Absent paths fall back to an empty store and an empty spec.
pub struct MockServer {
    config: ServerConfig,
    state: AppState,
}

impl MockServer {
    /// Create a server from configuration, loading the configured inputs.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let store = match &config.dataset {
            Some(path) => ObjectStore::from_file(path)?,
            None => ObjectStore::new(),
        };
        let spec = match &config.openapi_spec {
            Some(path) => SpecDocument::from_file(path)?,
            None => SpecDocument::empty(),
        };

        Ok(Self {
            config,
            state: AppState {
                store: Arc::new(store),
                spec: Arc::new(spec),
            },
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.state.store
    }

    pub fn spec_loaded(&self) -> bool {
        self.state.spec.is_loaded()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.chaos.clone())
    }

    /// Start serving requests until interrupted.
    pub async fn serve(self) -> anyhow::Result<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.bind_addr))?;
        info!("mock API server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
}
