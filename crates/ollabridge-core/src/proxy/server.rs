//! Axum application state and router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::proxy::config::GatewayConfig;
use crate::proxy::handlers;
use crate::proxy::resolver::ModelCatalog;
use crate::proxy::upstream::client::UpstreamClient;

/// Shared application state; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub catalog: Arc<ModelCatalog>,
    /// Permitted model short-names; empty means no filtering.
    pub model_filter: Arc<HashSet<String>>,
}

impl AppState {
    pub fn new(config: &GatewayConfig, model_filter: HashSet<String>) -> AppResult<Self> {
        let upstream = Arc::new(UpstreamClient::new(config)?);
        let catalog = Arc::new(ModelCatalog::new(upstream.clone()));
        Ok(Self { upstream, catalog, model_filter: Arc::new(model_filter) })
    }
}

/// Build the gateway router with all Ollama-protocol routes.
pub fn build_gateway_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/", get(handlers::handle_root))
        .route("/api/tags", get(handlers::handle_tags))
        .route("/api/show", post(handlers::handle_show))
        .route("/api/chat", post(handlers::handle_chat))
        .route("/api/generate", post(handlers::handle_generate))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gateway server instance.
pub struct AxumServer {
    config: GatewayConfig,
    model_filter: HashSet<String>,
}

impl AxumServer {
    pub fn new(config: GatewayConfig, model_filter: HashSet<String>) -> Self {
        Self { config, model_filter }
    }

    pub async fn run(self) -> AppResult<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        tracing::info!("Starting gateway on {}", addr);

        let state = AppState::new(&self.config, self.model_filter)?;
        let app = build_gateway_router(state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
