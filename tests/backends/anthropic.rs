use crate::support::{client_for, collect_chunks, request, sse_body, sse_response, API_KEY};
use platformed_generation::providers::anthropic::client::JSON_INSTRUCTION;
use platformed_generation::{Error, Provider};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "claude-3-5-haiku-latest";

fn message(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_123",
        "type": "message",
        "role": "assistant",
        "model": MODEL,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 4}
    })
}

/// A realistic Messages API event sequence producing "Hello world".
fn hello_world_events() -> Vec<String> {
    vec![
        json!({"type": "message_start", "message": {"id": "msg_123", "type": "message", "role": "assistant", "content": [], "model": MODEL}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "ping"}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hello"}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": " world"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 4}}),
        json!({"type": "message_stop"}),
    ]
    .into_iter()
    .map(|event| event.to_string())
    .collect()
}

#[tokio::test]
async fn test_generate_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", API_KEY))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "max_tokens": 2048,
            "temperature": 0.3,
            "system": "You are terse.",
            "messages": [{"role": "user", "content": "Say hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("Hello world")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let req = request(Provider::Anthropic, MODEL, "Say hello").with_system("You are terse.");

    let text = assert_ok!(client.generate_text(&req).await);
    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn test_stream_matches_generate_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse_response(sse_body(hello_world_events())))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("Hello world")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let req = request(Provider::Anthropic, MODEL, "Say hello");

    let stream = assert_ok!(client.stream_text(&req).await);
    let chunks = assert_ok!(collect_chunks(stream).await);
    assert_eq!(chunks, vec!["Hello", " world"]);

    let text = assert_ok!(client.generate_text(&req).await);
    assert_eq!(chunks.concat(), text);
}

#[tokio::test]
async fn test_stream_surfaces_error_events() {
    let server = MockServer::start().await;

    let mut events = hello_world_events();
    events.truncate(4);
    events.push(json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}).to_string());

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(sse_response(sse_body(events)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = assert_ok!(client.stream_text(&request(Provider::Anthropic, MODEL, "hi")).await);
    let err = assert_err!(collect_chunks(stream).await);

    assert!(matches!(err, Error::Stream(ref message) if message.contains("Overloaded")));
}

#[tokio::test]
async fn test_generate_json_appends_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "system": format!("Extract fields.\n\n{JSON_INSTRUCTION}")
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message(
            "Here is the data:\n{\"title\":\"Engineer\",\"remote\":true}\nLet me know if you need more.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let req = request(Provider::Anthropic, MODEL, "Posting text").with_system("Extract fields.");
    let value = assert_ok!(client.generate_json(&req).await);

    assert_eq!(value, json!({"title": "Engineer", "remote": true}));
}

#[tokio::test]
async fn test_generate_json_rejects_prose() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("not json")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_json(&request(Provider::Anthropic, MODEL, "hi")).await);

    assert!(matches!(err, Error::JsonExtraction(_)), "got {err:?}");
}

#[tokio::test]
async fn test_backend_error_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_text(&request(Provider::Anthropic, MODEL, "hi")).await);

    assert!(matches!(
        err,
        Error::Backend { provider: Provider::Anthropic, status: 529, ref message } if message == "Overloaded"
    ));
}

#[tokio::test]
async fn test_missing_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1", "content": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_text(&request(Provider::Anthropic, MODEL, "hi")).await);

    assert!(matches!(err, Error::MissingContent { provider: Provider::Anthropic, .. }));
}
