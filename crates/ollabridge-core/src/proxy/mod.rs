//! Proxy module - Ollama-compatible gateway over an OpenAI-style upstream.
//!
//! This module provides the full translation pipeline:
//! - Multimodal message normalization (text + base64 images)
//! - Model alias resolution against a cached upstream catalog
//! - Blocking and streaming chat relay with NDJSON re-emission

pub mod common;
pub mod config;
pub mod handlers;
pub mod mappers;
pub mod resolver;
pub mod server;
pub mod upstream;

pub use config::{load_model_filter, GatewayConfig};
pub use resolver::ModelCatalog;
pub use server::{build_gateway_router, AppState, AxumServer};
pub use upstream::client::UpstreamClient;
