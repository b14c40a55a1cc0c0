//! Gateway configuration (environment-derived) and the model allow-list loader.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_PORT: u16 = 11434;
pub const DEFAULT_X_TITLE: &str = "ollabridge";

/// Gateway configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bearer credential for the upstream provider.
    pub api_key: String,

    /// Upstream base URL (OpenAI-compatible, no trailing slash).
    pub base_url: String,

    /// `HTTP-Referer` header sent on every upstream call.
    pub http_referer: String,

    /// `X-Title` header sent on every upstream call.
    pub x_title: String,

    /// Host to bind the gateway listener on.
    pub host: String,

    /// TCP port to listen on (Ollama clients expect 11434).
    pub port: u16,

    /// Path to the model allow-list file.
    pub models_filter_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_referer: String::new(),
            x_title: DEFAULT_X_TITLE.to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            models_filter_path: "models-filter".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; the first CLI argument is accepted as
    /// a fallback for parity with the upstream tooling this replaces.
    pub fn from_env() -> AppResult<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => std::env::args().nth(1).ok_or_else(|| {
                AppError::Config(
                    "OPENAI_API_KEY environment variable or command-line argument not set"
                        .to_string(),
                )
            })?,
        };

        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http_referer = std::env::var("OPENROUTER_HTTP_REFERER").unwrap_or_default();
        let x_title = std::env::var("OPENROUTER_X_TITLE")
            .ok()
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_X_TITLE.to_string());

        let host =
            std::env::var("OLLABRIDGE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("OLLABRIDGE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let models_filter_path = std::env::var("OLLABRIDGE_MODELS_FILTER")
            .unwrap_or_else(|_| "models-filter".to_string());

        Ok(Self { api_key, base_url, http_referer, x_title, host, port, models_filter_path })
    }
}

/// Load the model allow-list: one permitted model name per line, blank
/// lines ignored. A missing file means no filtering and is not an error.
pub fn load_model_filter(path: impl AsRef<Path>) -> AppResult<HashSet<String>> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("models filter file {} not found, skipping model filtering", path.display());
            return Ok(HashSet::new());
        },
        Err(e) => return Err(AppError::Io(e)),
    };

    let filter: HashSet<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();

    if !filter.is_empty() {
        tracing::info!("Loaded {} models from filter file", filter.len());
        for model in &filter {
            tracing::info!(" - {}", model);
        }
    }

    Ok(filter)
}
