use std::sync::Arc;

use tokio::net::TcpListener;
use yodo_store::{FsOnceStore, FsStoreConfig, OnceStore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// YODO HTTP server.
pub struct YodoServer {
    config: ServerConfig,
    store: Arc<dyn OnceStore>,
}

impl YodoServer {
    /// Open the filesystem store named by `config.state_dir`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = FsOnceStore::open(&config.state_dir, FsStoreConfig::default())?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Serve from an already opened store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn OnceStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(self.store.clone(), self.config.clone()))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            bind_addr = %self.config.bind_addr,
            state_dir = %self.config.state_dir.display(),
            max_content_length = self.config.upload_limit(),
            "YODO server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
