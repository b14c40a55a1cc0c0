//! `/api/generate` handler: single-prompt completions, streamed by default.

use super::*;
use axum::body::Body;
use tracing::{error, info};

use crate::proxy::mappers::models::{GenerateRequest, InboundMessage, ROLE_USER};
use crate::proxy::mappers::streaming::{generate_response, ndjson_stream, EnvelopeFlavor};
use crate::proxy::mappers::normalize_messages;

pub async fn handle_generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<axum::response::Response, (StatusCode, Json<Value>)> {
    let request: GenerateRequest = parse_body(&body)?;

    let stream_requested = request.stream.unwrap_or(true);

    info!(model = %request.model, "generate request");
    let full_model_name = state.catalog.resolve(&request.model).await.map_err(|e| {
        error!(model = %request.model, "failed to resolve model name: {}", e);
        json_error(StatusCode::NOT_FOUND, e.to_string())
    })?;
    info!(model = %full_model_name, "using model");

    // The prompt becomes a single user message; images attach to it the
    // same way request-level images do for /api/chat.
    let inbound = [InboundMessage {
        role: ROLE_USER.to_string(),
        content: request.prompt.clone(),
        images: None,
    }];
    let images = request.images.as_deref().unwrap_or_default();
    let messages = normalize_messages(&inbound, request.system.as_deref(), images);

    if !stream_requested {
        let response = state.upstream.chat(&full_model_name, &messages).await.map_err(|e| {
            error!("failed to get generate response: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

        let body = generate_response(&full_model_name, &response)
            .map_err(|e| json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        return Ok(Json(body).into_response());
    }

    let upstream_stream =
        state.upstream.chat_stream(&full_model_name, &messages).await.map_err(|e| {
            error!("failed to create generate stream: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let lines = ndjson_stream(upstream_stream, full_model_name, EnvelopeFlavor::Generate);
    Ok(super::chat::ndjson_response(Body::from_stream(lines)))
}
