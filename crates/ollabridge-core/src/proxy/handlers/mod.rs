//! Ollama-protocol HTTP handlers.

mod chat;
mod generate;
mod models;

pub use chat::handle_chat;
pub use generate::handle_generate;
pub use models::{handle_root, handle_show, handle_tags};

// Shared imports for submodules
use axum::body::Bytes;
use axum::{extract::Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{json, Value};

use crate::proxy::server::AppState;

/// Structured JSON error in the shape Ollama clients expect.
fn json_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

/// Parse a raw request body ourselves instead of going through the `Json`
/// extractor: clients get the structured `{"error": ...}` shape for any
/// malformed payload, and the `Content-Type` header is not enforced.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, (StatusCode, Json<Value>)> {
    serde_json::from_slice(body)
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "Invalid JSON payload"))
}
