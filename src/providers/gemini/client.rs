use super::types::{GeminiContent, GeminiPart, GenerateContentRequest, GenerationConfig};
use crate::adapter::{Adapter, TextStream};
use crate::providers::{read_json, send_checked, text_chunks};
use crate::response_fields;
use crate::{extract_json, Error, GenerationRequest, Provider};
use reqwest::Client;
use serde_json::Value;

/// Appended to the user text in JSON mode alongside the JSON MIME type.
pub const JSON_HINT: &str = "Respond with valid JSON only.";

const JSON_MIME_TYPE: &str = "application/json";
const PARTS_POINTER: &str = "/candidates/0/content/parts";
const CONTENT_FIELD: &str = "candidates[0].content.parts[0].text";

/// Adapter for Gemini's generateContent API.
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Convert a generation request to a generateContent body.
    ///
    /// System text goes ahead of the prompt, separated by a blank line.
    fn convert_request(request: &GenerationRequest, json: bool) -> GenerateContentRequest {
        let mut text = match request.system_text() {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };
        if json {
            text.push_str("\n\n");
            text.push_str(JSON_HINT);
        }

        GenerateContentRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: json.then_some(JSON_MIME_TYPE),
            },
        }
    }

    fn endpoint(&self, model: &str, stream: bool) -> String {
        let model = model.trim_start_matches("models/");
        let base_url = self.base_url.trim_end_matches('/');
        if stream {
            format!("{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse")
        } else {
            format!("{base_url}/v1beta/models/{model}:generateContent")
        }
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        json: bool,
        stream: bool,
    ) -> Result<reqwest::Response, Error> {
        let body = Self::convert_request(request, json);
        let url = self.endpoint(&request.model, stream);
        tracing::debug!(provider = "gemini", url = %url, model = %request.model, json, stream, "sending generation request");

        let builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &request.api_key)
            .json(&body);

        send_checked(Provider::Gemini, builder).await
    }

    async fn complete(&self, request: &GenerationRequest, json: bool) -> Result<String, Error> {
        let response = self.send(request, json, false).await?;
        let body = read_json(Provider::Gemini, response, CONTENT_FIELD).await?;
        Self::content(&body)
    }

    fn content(body: &Value) -> Result<String, Error> {
        let text = Self::candidate_text(body);
        if text.is_empty() {
            if let Some(reason) = Self::block_reason(body) {
                tracing::warn!(reason, "gemini blocked the prompt");
            }
            return Err(Error::missing_content(Provider::Gemini, CONTENT_FIELD));
        }
        Ok(text)
    }

    /// Each streamed frame is a full response object whose part texts form one chunk.
    ///
    /// A frame reporting a blocked prompt ends the stream with an error.
    fn delta(event: &Value) -> Result<Option<String>, Error> {
        let text = Self::candidate_text(event);
        if text.is_empty() {
            if let Some(reason) = Self::block_reason(event) {
                tracing::warn!(reason, "gemini blocked the prompt");
                return Err(Error::stream(format!("gemini blocked the prompt: {reason}")));
            }
        }
        Ok(Some(text))
    }

    fn block_reason(body: &Value) -> Option<&str> {
        response_fields::str_at(body, "/promptFeedback/blockReason")
    }

    /// Text of every part of the first candidate, in order.
    fn candidate_text(body: &Value) -> String {
        response_fields::array_at(body, PARTS_POINTER)
            .map(|parts| response_fields::join_texts(parts, None))
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Adapter for GeminiAdapter {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, Error> {
        self.complete(request, false).await
    }

    async fn stream_text(&self, request: &GenerationRequest) -> Result<TextStream, Error> {
        let response = self.send(request, false, true).await?;
        Ok(text_chunks(Provider::Gemini, response, None, Self::delta))
    }

    async fn generate_json(&self, request: &GenerationRequest) -> Result<Value, Error> {
        let text = self.complete(request, true).await?;
        extract_json(&text)
    }
}
