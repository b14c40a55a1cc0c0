//! Wire types: inbound Ollama request shapes and outbound OpenAI-compatible
//! message/response shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

// ---------------------------------------------------------------------------
// Inbound (Ollama protocol)
// ---------------------------------------------------------------------------

/// One message of an `/api/chat` request. Images ride alongside the text as
/// bare base64 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct InboundMessage {
    /// Message role (`system`, `user`, `assistant`).
    pub role: String,
    /// Plain text content.
    #[serde(default)]
    pub content: String,
    /// Message-scoped base64 images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// `/api/chat` request body.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ChatRequest {
    /// Model alias, possibly partial (e.g. `"sonnet"`).
    pub model: String,
    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    /// Streaming flag; Ollama clients that omit it expect streaming.
    #[serde(default)]
    pub stream: Option<bool>,
    /// Request-level base64 images, attached to the last user message.
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Generation options; accepted but not forwarded.
    #[serde(default)]
    pub options: Option<Value>,
    /// Keep-alive hint; accepted but not forwarded.
    #[serde(default)]
    pub keep_alive: Option<Value>,
}

/// `/api/generate` request body.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct GenerateRequest {
    /// Model alias, possibly partial.
    pub model: String,
    /// Single prompt string.
    #[serde(default)]
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system: Option<String>,
    /// Streaming flag; defaults to streaming when omitted.
    #[serde(default)]
    pub stream: Option<bool>,
    /// Base64 images for the prompt.
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Generation options; accepted but not forwarded.
    #[serde(default)]
    pub options: Option<Value>,
}

// ---------------------------------------------------------------------------
// Outbound (OpenAI-compatible upstream)
// ---------------------------------------------------------------------------

/// Content of an upstream message: plain text or an ordered list of typed
/// parts. Exactly one representation is ever serialized; parts supersede
/// text once images are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum UpstreamContent {
    /// Plain text content.
    Text(String),
    /// Multimodal content parts.
    Parts(Vec<ContentPart>),
}

/// One typed content unit within a multimodal message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum ContentPart {
    /// Text part.
    #[serde(rename = "text")]
    Text {
        /// Text content.
        text: String,
    },
    /// Image-by-URL part; the URL is always fully qualified (external URL
    /// or synthesized data URL).
    #[serde(rename = "image_url")]
    ImageUrl {
        /// Image URL wrapper.
        image_url: ImageUrl,
    },
}

/// Image URL wrapper matching the upstream wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageUrl {
    /// Embeddable image reference.
    pub url: String,
}

/// One message as sent to the upstream chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct UpstreamMessage {
    /// Message role.
    pub role: String,
    /// Text or content-part payload.
    pub content: UpstreamContent,
}

impl UpstreamMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: UpstreamContent::Text(content.into()) }
    }
}

// ---------------------------------------------------------------------------
// Upstream responses
// ---------------------------------------------------------------------------

/// Non-streaming chat completion response.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message within a completion choice.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage summary.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[non_exhaustive]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Model catalog listing response (`GET /models`).
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

/// One catalog entry; only the fully qualified id matters here.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct ModelEntry {
    pub id: String,
}
