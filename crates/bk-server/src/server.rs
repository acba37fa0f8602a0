use std::sync::Arc;

use bk_studio::Studio;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Brandkit HTTP server.
pub struct BrandkitServer {
    config: ServerConfig,
    state: AppState,
}

impl BrandkitServer {
    pub fn new(config: ServerConfig, studio: Arc<Studio>) -> Self {
        Self {
            config,
            state: AppState::new(studio),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("brandkit server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
