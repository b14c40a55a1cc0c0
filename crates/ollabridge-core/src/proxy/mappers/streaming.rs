//! Stream translation: upstream SSE chunks → Ollama-style NDJSON lines.
//!
//! The upstream emits `data: {json}` events terminated by `data: [DONE]`.
//! Each event maps to exactly one NDJSON line flushed immediately, in
//! upstream order. The stream ends with a single `done: true` terminal
//! line, except after a mid-stream transport error, where one in-band
//! `{"error": ...}` line is emitted and the stream closes with no terminal
//! line. Once a line is flushed it is never rewound.

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::pin::Pin;
use tracing::{debug, error};

use crate::proxy::mappers::models::{ChatCompletionResponse, Usage, ROLE_ASSISTANT};

/// Fixed 5 ms load-time placeholder reported in generate envelopes; there
/// is no local model load to measure.
const GENERATE_LOAD_DURATION_NS: u64 = 5_000_000;

/// Which Ollama envelope shape to emit. The chat flavor nests deltas under
/// `message`, the generate flavor uses a flat `response` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFlavor {
    Chat,
    Generate,
}

impl EnvelopeFlavor {
    /// Intermediate envelope: one content delta, `done: false`.
    fn delta_envelope(self, model: &str, delta: &str) -> Value {
        match self {
            Self::Chat => json!({
                "model": model,
                "created_at": Utc::now().to_rfc3339(),
                "message": { "role": ROLE_ASSISTANT, "content": delta },
                "done": false,
            }),
            Self::Generate => json!({
                "model": model,
                "created_at": Utc::now().to_rfc3339(),
                "response": delta,
                "done": false,
            }),
        }
    }

    /// Terminal envelope: empty delta, `done: true`, remembered finish
    /// reason and zero or usage-derived statistics.
    fn terminal_envelope(self, model: &str, finish_reason: &str, usage: Option<Usage>) -> Value {
        let usage = usage.unwrap_or_default();
        match self {
            Self::Chat => json!({
                "model": model,
                "created_at": Utc::now().to_rfc3339(),
                "message": { "role": ROLE_ASSISTANT, "content": "" },
                "done": true,
                "finish_reason": finish_reason,
                "total_duration": usage.total_tokens.saturating_mul(10),
                "load_duration": 0,
                "prompt_eval_count": usage.prompt_tokens,
                "eval_count": usage.completion_tokens,
                "eval_duration": usage.completion_tokens.saturating_mul(10),
            }),
            Self::Generate => json!({
                "model": model,
                "created_at": Utc::now().to_rfc3339(),
                "response": "",
                "done": true,
                "done_reason": finish_reason,
                "context": [1, 2, 3],
                "total_duration": usage.total_tokens.saturating_mul(10_000_000),
                "load_duration": GENERATE_LOAD_DURATION_NS,
                "prompt_eval_count": usage.prompt_tokens,
                "prompt_eval_duration": usage.prompt_tokens.saturating_mul(10_000_000),
                "eval_count": usage.completion_tokens,
                "eval_duration": usage.completion_tokens.saturating_mul(10_000_000),
            }),
        }
    }
}

fn ndjson_line(value: &Value) -> Bytes {
    let mut line = value.to_string();
    line.push('\n');
    Bytes::from(line)
}

/// Translate an upstream SSE byte stream into NDJSON lines.
///
/// Dropping the returned stream (for example on client disconnect) drops
/// the upstream handle on every exit path.
pub fn ndjson_stream<S, E>(
    upstream: S,
    model: String,
    flavor: EnvelopeFlavor,
) -> Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut upstream = Box::pin(upstream);
    let mut buffer = BytesMut::new();

    let stream = async_stream::stream! {
        let mut last_finish_reason: Option<String> = None;
        let mut final_usage: Option<Usage> = None;

        while let Some(item) = upstream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("upstream stream error: {}", e);
                    let line = ndjson_line(&json!({
                        "error": format!("Stream error: {}", e),
                    }));
                    yield Ok::<Bytes, std::io::Error>(line);
                    // Abrupt close is the terminal signal here; no done line.
                    return;
                },
            };

            buffer.extend_from_slice(&bytes);

            // Process complete lines from buffer
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line_raw = buffer.split_to(pos + 1);
                let Ok(line_str) = std::str::from_utf8(&line_raw) else { continue };
                let line = line_str.trim();
                if line.is_empty() {
                    continue;
                }

                let Some(json_part) = line.strip_prefix("data: ") else { continue };
                let json_part = json_part.trim();
                if json_part == "[DONE]" {
                    continue;
                }

                let Ok(event) = serde_json::from_str::<Value>(json_part) else {
                    debug!("skipping unparseable SSE event");
                    continue;
                };

                if let Some(usage) = event.get("usage") {
                    if let Ok(parsed) = serde_json::from_value::<Usage>(usage.clone()) {
                        final_usage = Some(parsed);
                    }
                }

                let Some(choice) = event.get("choices").and_then(|c| c.as_array()).and_then(|c| c.first()) else {
                    continue;
                };

                if let Some(reason) = choice.get("finish_reason").and_then(|f| f.as_str()) {
                    last_finish_reason = Some(reason.to_string());
                }

                let delta = choice
                    .get("delta")
                    .and_then(|d| d.get("content"))
                    .and_then(|c| c.as_str())
                    .unwrap_or("");

                yield Ok(ndjson_line(&flavor.delta_envelope(&model, delta)));
            }
        }

        let finish_reason = last_finish_reason.as_deref().unwrap_or("stop");
        yield Ok(ndjson_line(&flavor.terminal_envelope(&model, finish_reason, final_usage)));
    };

    Box::pin(stream)
}

/// Build the single non-streaming chat response object.
///
/// # Errors
///
/// A response with zero choices is an upstream error, not a panic.
pub fn chat_response(
    model: &str,
    response: &ChatCompletionResponse,
) -> Result<Value, crate::error::AppError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| crate::error::AppError::Upstream("No response from model".to_string()))?;

    let content = choice
        .message
        .as_ref()
        .and_then(|m| m.content.as_deref())
        .unwrap_or("");
    let finish_reason = choice.finish_reason.as_deref().unwrap_or("stop");
    let usage = response.usage.unwrap_or_default();

    Ok(json!({
        "model": model,
        "created_at": Utc::now().to_rfc3339(),
        "message": { "role": ROLE_ASSISTANT, "content": content },
        "done": true,
        "finish_reason": finish_reason,
        "total_duration": usage.total_tokens.saturating_mul(10),
        "load_duration": 0,
        "prompt_eval_count": usage.prompt_tokens,
        "eval_count": usage.completion_tokens,
        "eval_duration": usage.completion_tokens.saturating_mul(10),
    }))
}

/// Build the single non-streaming generate response object.
pub fn generate_response(
    model: &str,
    response: &ChatCompletionResponse,
) -> Result<Value, crate::error::AppError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| crate::error::AppError::Upstream("No response from model".to_string()))?;

    let content = choice
        .message
        .as_ref()
        .and_then(|m| m.content.as_deref())
        .unwrap_or("");
    let finish_reason = choice.finish_reason.as_deref().unwrap_or("stop");
    let usage = response.usage.unwrap_or_default();

    Ok(json!({
        "model": model,
        "created_at": Utc::now().to_rfc3339(),
        "response": content,
        "done": true,
        "done_reason": finish_reason,
        "context": [1, 2, 3],
        "total_duration": usage.total_tokens.saturating_mul(10_000_000),
        "load_duration": GENERATE_LOAD_DURATION_NS,
        "prompt_eval_count": usage.prompt_tokens,
        "prompt_eval_duration": usage.prompt_tokens.saturating_mul(10_000_000),
        "eval_count": usage.completion_tokens,
        "eval_duration": usage.completion_tokens.saturating_mul(10_000_000),
    }))
}
