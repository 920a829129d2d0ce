use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Airframe HTTP server.
pub struct AirframeServer {
    config: ServerConfig,
    state: AppState,
}

impl AirframeServer {
    /// Build a server whose store is selected by `config.backend`.
    pub fn new(config: ServerConfig) -> Self {
        let store = config.build_store();
        Self { state: AppState::new(store, config.clone()), config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            backend = self.state.store.backend_name(),
            "Airframe server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;

    #[test]
    fn server_construction() {
        let server = AirframeServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(server.state.store.backend_name(), "memory");
    }

    #[test]
    fn document_backend_is_selected() {
        let config = ServerConfig { backend: BackendKind::Document, ..ServerConfig::default() };
        let server = AirframeServer::new(config);
        assert_eq!(server.state.store.backend_name(), "document");
        let _router = server.router();
    }
}
