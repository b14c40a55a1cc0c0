//! End-to-end gateway tests: a wiremock upstream behind the full router.

use std::collections::HashSet;

use axum_test::TestServer;
use bytes::Bytes;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ollabridge_core::proxy::{build_gateway_router, AppState, GatewayConfig};

fn test_config(upstream_uri: &str) -> GatewayConfig {
    GatewayConfig {
        api_key: "test-key".to_string(),
        base_url: upstream_uri.to_string(),
        ..GatewayConfig::default()
    }
}

fn gateway(upstream_uri: &str, filter: HashSet<String>) -> TestServer {
    let state = AppState::new(&test_config(upstream_uri), filter).expect("client builds");
    TestServer::new(build_gateway_router(state)).expect("router builds")
}

fn models_body(ids: &[&str]) -> Value {
    json!({ "data": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>() })
}

fn completion_body(content: &str) -> Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
    })
}

async fn mount_models(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_body(ids)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn root_reports_ollama_liveness() {
    let upstream = MockServer::start().await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "Ollama is running");
}

#[tokio::test]
async fn tags_lists_catalog_with_stub_details() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4", "openai/gpt-4o"]).await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server.get("/api/tags").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let models = body["models"].as_array().expect("models array");
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["name"], "claude-sonnet-4");
    assert_eq!(models[0]["details"]["format"], "gguf");
    assert_eq!(models[1]["model"], "gpt-4o");
}

#[tokio::test]
async fn tags_applies_allow_list_on_short_names() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4", "openai/gpt-4o"]).await;

    let filter: HashSet<String> = ["gpt-4o".to_string()].into_iter().collect();
    let server = gateway(&upstream.uri(), filter);

    let response = server.get("/api/tags").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let models = body["models"].as_array().expect("models array");
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["name"], "gpt-4o");
}

#[tokio::test]
async fn tags_surfaces_upstream_failure_as_server_error() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server.get("/api/tags").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn chat_resolves_suffix_alias_against_catalog() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/chat")
        .json(&json!({
            "model": "sonnet-4",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["model"], "anthropic/claude-sonnet-4");
    assert_eq!(body["message"]["content"], "hello");
    assert_eq!(body["done"], true);
    assert_eq!(body["finish_reason"], "stop");
    assert_eq!(body["prompt_eval_count"], 5);

    // The upstream must have been called with the fully qualified id.
    let requests = upstream.received_requests().await.expect("recording enabled");
    let chat_request = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .expect("chat call recorded");
    let sent: Value = serde_json::from_slice(&chat_request.body).expect("json body");
    assert_eq!(sent["model"], "anthropic/claude-sonnet-4");
    assert_eq!(sent["stream"], false);
}

#[tokio::test]
async fn unknown_alias_passes_through_unchanged() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/chat")
        .json(&json!({
            "model": "vendor/custom-model",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["model"], "vendor/custom-model");
}

#[tokio::test]
async fn chat_with_empty_catalog_and_failing_fetch_returns_not_found() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/chat")
        .json(&json!({
            "model": "gpt-x",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    // A single prefix: the refresh failure is not wrapped twice.
    assert_eq!(body["error"], "Upstream error: failed to get models: 503: unavailable");
}

#[tokio::test]
async fn chat_rejects_malformed_payload_before_any_upstream_call() {
    let upstream = MockServer::start().await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/chat")
        .content_type("application/json")
        .json(&json!({"messages": "not-an-array"}))
        .await;

    response.assert_status_bad_request();
    assert!(upstream.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn syntactically_invalid_json_gets_structured_error() {
    let upstream = MockServer::start().await;
    let server = gateway(&upstream.uri(), HashSet::new());

    for endpoint in ["/api/chat", "/api/generate"] {
        let response = server
            .post(endpoint)
            .content_type("application/json")
            .bytes(Bytes::from_static(b"{not json"))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid JSON payload");
    }

    assert!(upstream.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn json_content_type_is_not_required() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    // Some Ollama clients post without `Content-Type: application/json`.
    let payload = json!({
        "model": "sonnet-4",
        "messages": [{"role": "user", "content": "hi"}],
        "stream": false
    });
    let response = server
        .post("/api/chat")
        .content_type("text/plain")
        .bytes(Bytes::from(payload.to_string()))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"]["content"], "ok");
}

#[tokio::test]
async fn chat_with_zero_choices_is_a_server_error_not_a_panic() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/chat")
        .json(&json!({
            "model": "sonnet-4",
            "messages": [{"role": "user", "content": "hi"}],
            "stream": false
        }))
        .await;

    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn streaming_chat_emits_ndjson_with_terminal_line() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;

    let delta = |content: &str| {
        json!({"choices": [{"delta": {"content": content}, "finish_reason": null}]}).to_string()
    };
    let sse = format!("data: {}\n\ndata: {}\n\ndata: [DONE]\n\n", delta("Hel"), delta("lo"));
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    // stream omitted: streaming is the default
    let response = server
        .post("/api/chat")
        .json(&json!({
            "model": "sonnet-4",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/x-ndjson");

    let lines: Vec<Value> = response
        .text()
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line parses independently"))
        .collect();

    assert_eq!(lines.len(), 3, "two deltas plus one terminal line");
    assert_eq!(lines[0]["message"]["content"], "Hel");
    assert_eq!(lines[0]["done"], false);
    assert_eq!(lines[1]["message"]["content"], "lo");
    assert_eq!(lines[2]["done"], true);
    assert_eq!(lines[2]["finish_reason"], "stop");
}

#[tokio::test]
async fn generate_attaches_top_level_png_as_content_part() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("a cat")))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/generate")
        .json(&json!({
            "model": "sonnet-4",
            "prompt": "What is in this image?",
            "images": ["iVBORw0KG"],
            "stream": false
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["response"], "a cat");
    assert_eq!(body["done"], true);
    assert_eq!(body["done_reason"], "stop");

    let requests = upstream.received_requests().await.expect("recording enabled");
    let chat_request = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .expect("chat call recorded");
    let sent: Value = serde_json::from_slice(&chat_request.body).expect("json body");

    let content = &sent["messages"][0]["content"];
    assert_eq!(content[0]["type"], "text");
    assert_eq!(content[0]["text"], "What is in this image?");
    assert_eq!(content[1]["type"], "image_url");
    assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,iVBORw0KG");
}

#[tokio::test]
async fn generate_with_system_prompt_prepends_system_message() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&upstream)
        .await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server
        .post("/api/generate")
        .json(&json!({
            "model": "sonnet-4",
            "prompt": "hello",
            "system": "be brief",
            "stream": false
        }))
        .await;
    response.assert_status_ok();

    let requests = upstream.received_requests().await.expect("recording enabled");
    let chat_request = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .expect("chat call recorded");
    let sent: Value = serde_json::from_slice(&chat_request.body).expect("json body");

    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][0]["content"], "be brief");
    assert_eq!(sent["messages"][1]["role"], "user");
    assert_eq!(sent["messages"][1]["content"], "hello");
}

#[tokio::test]
async fn upstream_receives_attribution_headers() {
    let upstream = MockServer::start().await;
    mount_models(&upstream, &["anthropic/claude-sonnet-4"]).await;
    let server = gateway(&upstream.uri(), HashSet::new());

    server.get("/api/tags").await.assert_status_ok();

    let requests = upstream.received_requests().await.expect("recording enabled");
    let models_request =
        requests.iter().find(|r| r.url.path() == "/models").expect("models call recorded");
    assert_eq!(
        models_request.headers.get("authorization").expect("bearer header"),
        "Bearer test-key"
    );
    assert_eq!(models_request.headers.get("x-title").expect("title header"), "ollabridge");
    assert!(models_request.headers.contains_key("http-referer"));
}

#[tokio::test]
async fn show_requires_model_name() {
    let upstream = MockServer::start().await;
    let server = gateway(&upstream.uri(), HashSet::new());

    let response = server.post("/api/show").json(&json!({})).await;
    response.assert_status_bad_request();

    let response = server.post("/api/show").bytes(Bytes::from_static(b"{")).await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid JSON payload");

    let response = server.post("/api/show").json(&json!({"name": "claude-sonnet-4"})).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["details"]["format"], "gguf");
}
