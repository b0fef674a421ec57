use crate::support::{client_for, collect_chunks, request, sse_body, sse_response, API_KEY};
use platformed_generation::providers::gemini::client::JSON_HINT;
use platformed_generation::{Error, Provider};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-flash";
const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

fn candidate(parts: serde_json::Value) -> serde_json::Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": parts}, "index": 0}],
        "modelVersion": MODEL
    })
}

#[tokio::test]
async fn test_generate_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "You are terse.\n\nSay hello"}]}],
            "generationConfig": {"temperature": 0.3, "maxOutputTokens": 2048}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([{"text": "Hello world"}]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let req = request(Provider::Gemini, MODEL, "Say hello").with_system("You are terse.");

    let text = assert_ok!(client.generate_text(&req).await);
    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn test_stream_matches_generate_text() {
    let server = MockServer::start().await;

    let mut last = candidate(json!([{"text": " is"}, {"text": " here."}]));
    last["candidates"][0]["finishReason"] = json!("STOP");
    last["usageMetadata"] = json!({"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7});

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .respond_with(sse_response(sse_body([
            candidate(json!([{"text": "Gemini"}])).to_string(),
            // A frame with no text, such as a trailing usage-only update.
            json!({"usageMetadata": {"promptTokenCount": 3}}).to_string(),
            last.to_string(),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([
            {"text": "Gemini is"},
            {"text": " here."}
        ]))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let req = request(Provider::Gemini, MODEL, "Introduce yourself");

    let stream = assert_ok!(client.stream_text(&req).await);
    let chunks = assert_ok!(collect_chunks(stream).await);
    assert_eq!(chunks, vec!["Gemini", " is here."]);

    let text = assert_ok!(client.generate_text(&req).await);
    assert_eq!(chunks.concat(), text);
}

#[tokio::test]
async fn test_generate_json_sets_mime_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": format!("Summarize\n\n{JSON_HINT}")}]}],
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([
            {"text": "[{\"stage\":\"applied\"},{\"stage\":\"interview\"}]"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let value = assert_ok!(client.generate_json(&request(Provider::Gemini, MODEL, "Summarize")).await);

    assert_eq!(value, json!([{"stage": "applied"}, {"stage": "interview"}]));
}

#[tokio::test]
async fn test_generate_json_rejects_prose() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([{"text": "Sorry, no."}]))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_json(&request(Provider::Gemini, MODEL, "hi")).await);

    assert!(matches!(err, Error::JsonExtraction(_)), "got {err:?}");
}

#[tokio::test]
async fn test_backend_error_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_text(&request(Provider::Gemini, MODEL, "hi")).await);

    assert!(matches!(
        err,
        Error::Backend { provider: Provider::Gemini, status: 400, ref message } if message == "API key not valid."
    ));
}

#[tokio::test]
async fn test_backend_error_without_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream connect error"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_text(&request(Provider::Gemini, MODEL, "hi")).await);

    assert!(matches!(
        err,
        Error::Backend { status: 503, ref message, .. } if message == "Service Unavailable"
    ));
}

#[tokio::test]
async fn test_blocked_prompt_is_missing_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = assert_err!(client.generate_text(&request(Provider::Gemini, MODEL, "hi")).await);

    assert!(matches!(err, Error::MissingContent { provider: Provider::Gemini, .. }));
}

#[tokio::test]
async fn test_stream_blocked_prompt_is_stream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .respond_with(sse_response(sse_body([json!({
            "promptFeedback": {"blockReason": "SAFETY"},
            "usageMetadata": {"promptTokenCount": 5, "totalTokenCount": 5}
        })
        .to_string()])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = assert_ok!(client.stream_text(&request(Provider::Gemini, MODEL, "hi")).await);
    let err = assert_err!(collect_chunks(stream).await);

    assert!(matches!(err, Error::Stream(ref message) if message.contains("SAFETY")), "got {err:?}");
}
