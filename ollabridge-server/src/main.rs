//! Ollabridge Server - Headless Daemon
//!
//! A pure Rust HTTP server that speaks the Ollama REST/NDJSON protocol on
//! the client side and relays every call to an OpenAI-compatible upstream
//! (OpenRouter by default).
//!
//! Access via: http://localhost:11434

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ollabridge_core::proxy::{load_model_filter, AxumServer, GatewayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;

    let model_filter = load_model_filter(&config.models_filter_path)
        .map_err(|e| anyhow::anyhow!("error loading models filter: {}", e))?;

    info!("Upstream base URL: {}", config.base_url);
    info!(
        "Gateway listening on http://{}:{} (Ollama protocol)",
        config.host, config.port
    );

    AxumServer::new(config, model_filter)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
