use super::types::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use crate::adapter::{Adapter, TextStream};
use crate::providers::{read_json, send_checked, text_chunks};
use crate::response_fields;
use crate::sse_stream::DONE_SENTINEL;
use crate::{extract_json, Error, GenerationRequest, Provider};
use reqwest::Client;
use serde_json::Value;

const CONTENT_POINTER: &str = "/choices/0/message/content";
const CONTENT_FIELD: &str = "choices[0].message.content";
const DELTA_POINTER: &str = "/choices/0/delta/content";

/// Adapter for the chat-completions HTTP API.
pub struct OpenAIAdapter {
    client: Client,
    base_url: String,
}

impl OpenAIAdapter {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Convert a generation request to a chat completions body.
    fn convert_request(request: &GenerationRequest, json: bool, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_text() {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: json.then(ResponseFormat::json_object),
            stream: stream.then_some(true),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        json: bool,
        stream: bool,
    ) -> Result<reqwest::Response, Error> {
        let body = Self::convert_request(request, json, stream);
        let url = self.endpoint();
        tracing::debug!(provider = "openai", url = %url, model = %request.model, json, stream, "sending generation request");

        let builder = self
            .client
            .post(&url)
            .bearer_auth(&request.api_key)
            .json(&body);

        send_checked(Provider::OpenAI, builder).await
    }

    async fn complete(&self, request: &GenerationRequest, json: bool) -> Result<String, Error> {
        let response = self.send(request, json, false).await?;
        let body = read_json(Provider::OpenAI, response, CONTENT_FIELD).await?;
        Self::content(&body)
    }

    fn content(body: &Value) -> Result<String, Error> {
        response_fields::text_at(body, CONTENT_POINTER)
            .map(str::to_string)
            .ok_or_else(|| Error::missing_content(Provider::OpenAI, CONTENT_FIELD))
    }

    fn delta(event: &Value) -> Result<Option<String>, Error> {
        Ok(response_fields::str_at(event, DELTA_POINTER).map(str::to_string))
    }
}

#[async_trait::async_trait]
impl Adapter for OpenAIAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, Error> {
        self.complete(request, false).await
    }

    async fn stream_text(&self, request: &GenerationRequest) -> Result<TextStream, Error> {
        let response = self.send(request, false, true).await?;
        Ok(text_chunks(
            Provider::OpenAI,
            response,
            Some(DONE_SENTINEL),
            Self::delta,
        ))
    }

    async fn generate_json(&self, request: &GenerationRequest) -> Result<Value, Error> {
        let text = self.complete(request, true).await?;
        extract_json(&text)
    }
}
