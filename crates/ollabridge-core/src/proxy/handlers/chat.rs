//! `/api/chat` handler: multi-message conversations, streamed by default.

use super::*;
use axum::body::Body;
use axum::response::Response;
use tracing::{error, info};

use crate::proxy::mappers::models::ChatRequest;
use crate::proxy::mappers::streaming::{chat_response, ndjson_stream, EnvelopeFlavor};
use crate::proxy::mappers::normalize_messages;

pub async fn handle_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let request: ChatRequest = parse_body(&body)?;

    // Ollama clients that omit the flag expect streaming.
    let stream_requested = request.stream.unwrap_or(true);

    info!(model = %request.model, "chat request");
    let full_model_name = state.catalog.resolve(&request.model).await.map_err(|e| {
        error!(model = %request.model, "failed to resolve model name: {}", e);
        // Ollama returns 404 for model names it cannot resolve.
        json_error(StatusCode::NOT_FOUND, e.to_string())
    })?;
    info!(model = %full_model_name, "using model");

    let top_level_images = request.images.as_deref().unwrap_or_default();
    let messages = normalize_messages(&request.messages, None, top_level_images);

    if !stream_requested {
        let response = state.upstream.chat(&full_model_name, &messages).await.map_err(|e| {
            error!("failed to get chat response: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

        let body = chat_response(&full_model_name, &response)
            .map_err(|e| json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        return Ok(Json(body).into_response());
    }

    let upstream_stream =
        state.upstream.chat_stream(&full_model_name, &messages).await.map_err(|e| {
            error!("failed to create stream: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let lines = ndjson_stream(upstream_stream, full_model_name, EnvelopeFlavor::Chat);
    Ok(ndjson_response(Body::from_stream(lines)))
}

/// Response wrapper for newline-delimited JSON streaming.
pub(super) fn ndjson_response(body: Body) -> Response {
    Response::builder()
        .header("Content-Type", "application/x-ndjson")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .body(body)
        .expect("valid streaming response")
        .into_response()
}
