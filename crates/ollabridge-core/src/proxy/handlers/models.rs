//! Model listing and metadata stubs (`/api/tags`, `/api/show`, `/`).

use super::*;
use chrono::Utc;
use tracing::error;

/// Liveness probe; Ollama clients check this exact body.
pub async fn handle_root() -> &'static str {
    "Ollama is running"
}

/// `GET /api/tags`: the resolved catalog filtered through the allow-list,
/// dressed up as Ollama model entries with stubbed local metadata.
pub async fn handle_tags(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let snapshot = state.catalog.refresh().await.map_err(|e| {
        error!("error getting models: {}", e);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let now = Utc::now().to_rfc3339();
    let filter = &state.model_filter;

    let models: Vec<Value> = snapshot
        .iter()
        .map(|id| id.rsplit('/').next().unwrap_or(id.as_str()))
        .filter(|short_name| filter.is_empty() || filter.contains(*short_name))
        .map(|short_name| {
            json!({
                "name": short_name,
                "model": short_name,
                "modified_at": now,
                // Local-install metadata has no upstream equivalent; these
                // stubs keep Ollama clients rendering the list.
                "size": 270_898_672_u64,
                "digest": "9077fe9d2ae1a4a41a868836b56b8163731a8fe16621397028c2c76f838c6907",
                "details": {
                    "parent_model": "",
                    "format": "gguf",
                    "family": "claude",
                    "families": ["claude"],
                    "parameter_size": "175B",
                    "quantization_level": "Q4_K_M"
                }
            })
        })
        .collect();

    Ok(Json(json!({ "models": models })))
}

/// `POST /api/show`: hardcoded model detail stub.
pub async fn handle_show(
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let body: Value = parse_body(&body)?;
    let model_name = body
        .get("name")
        .and_then(|n| n.as_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, "Model name is required"))?;

    tracing::debug!(model = model_name, "show request");

    Ok(Json(json!({
        "license": "STUB License",
        "system": "STUB SYSTEM",
        "modifiedAt": Utc::now().to_rfc3339(),
        "details": {
            "format": "gguf",
            "parameter_size": "200B",
            "quantization_level": "Q4_K_M"
        },
        "model_info": {
            "architecture": "STUB",
            "context_length": 200_000,
            "parameter_count": 200_000_000_000_u64
        }
    })))
}
