//! HTTP client for the upstream OpenAI-compatible provider.
//!
//! Every call carries the bearer credential plus the `HTTP-Referer` and
//! `X-Title` attribution headers OpenRouter expects. Errors are surfaced
//! verbatim to the caller; the gateway performs no retries.

use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::proxy::config::GatewayConfig;
use crate::proxy::mappers::models::{ChatCompletionResponse, ModelList, UpstreamMessage};

/// Timeout for non-streaming calls. Streaming responses are bounded by the
/// transport's own connection semantics instead.
const REQUEST_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct UpstreamClient {
    http: Client,
    base_url: String,
    api_key: String,
    http_referer: String,
    x_title: String,
}

impl UpstreamClient {
    /// Build a client from gateway configuration.
    ///
    /// The total-request timeout is applied per call so that open-ended
    /// streaming bodies are not cut off by the client builder.
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .build()
            .map_err(AppError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_referer: config.http_referer.clone(),
            x_title: config.x_title.clone(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.http_referer)
            .header("X-Title", &self.x_title)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.http_referer)
            .header("X-Title", &self.x_title)
    }

    /// Blocking chat completion call.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[UpstreamMessage],
    ) -> AppResult<ChatCompletionResponse> {
        debug!(model, count = messages.len(), "upstream chat (blocking)");

        let response = self
            .post("/chat/completions")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&json!({
                "model": model,
                "messages": messages,
                "stream": false,
            }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<ChatCompletionResponse>().await?)
    }

    /// Streaming chat completion call. Returns the raw SSE byte stream;
    /// dropping it releases the upstream connection.
    pub async fn chat_stream(
        &self,
        model: &str,
        messages: &[UpstreamMessage],
    ) -> AppResult<impl Stream<Item = Result<Bytes, reqwest::Error>>> {
        debug!(model, count = messages.len(), "upstream chat (streaming)");

        let response = self
            .post("/chat/completions")
            .json(&json!({
                "model": model,
                "messages": messages,
                "stream": true,
            }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.bytes_stream())
    }

    /// Fetch the upstream model catalog as fully qualified identifiers.
    pub async fn list_models(&self) -> AppResult<Vec<String>> {
        let response = self
            .get("/models")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let list = response.json::<ModelList>().await?;
        Ok(list.data.into_iter().map(|entry| entry.id).collect())
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Upstream(format!("{}: {}", status.as_u16(), body)))
    }
}
