use super::types::{AnthropicMessage, MessagesRequest};
use crate::adapter::{Adapter, TextStream};
use crate::providers::{read_json, send_checked, text_chunks};
use crate::response_fields;
use crate::{extract_json, Error, GenerationRequest, Provider};
use reqwest::Client;
use serde_json::Value;

const API_VERSION: &str = "2023-06-01";

/// Appended to the system text in JSON mode; the Messages API has no
/// structured-output switch.
pub const JSON_INSTRUCTION: &str =
    "Return only valid JSON. Do not include any prose or code fences.";

const CONTENT_FIELD: &str = "content[0].text";

/// Adapter for the Anthropic Messages API.
pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Convert a generation request to a Messages API body.
    fn convert_request(request: &GenerationRequest, json: bool, stream: bool) -> MessagesRequest {
        let system = match (request.system_text(), json) {
            (Some(system), true) => Some(format!("{system}\n\n{JSON_INSTRUCTION}")),
            (None, true) => Some(JSON_INSTRUCTION.to_string()),
            (system, false) => system.map(str::to_string),
        };

        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: stream.then_some(true),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        json: bool,
        stream: bool,
    ) -> Result<reqwest::Response, Error> {
        let body = Self::convert_request(request, json, stream);
        let url = self.endpoint();
        tracing::debug!(provider = "anthropic", url = %url, model = %request.model, json, stream, "sending generation request");

        let builder = self
            .client
            .post(&url)
            .header("x-api-key", &request.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        send_checked(Provider::Anthropic, builder).await
    }

    async fn complete(&self, request: &GenerationRequest, json: bool) -> Result<String, Error> {
        let response = self.send(request, json, false).await?;
        let body = read_json(Provider::Anthropic, response, CONTENT_FIELD).await?;
        Self::content(&body)
    }

    /// Concatenate every text block, falling back to `content[0].text`.
    fn content(body: &Value) -> Result<String, Error> {
        let joined = response_fields::array_at(body, "/content")
            .map(|blocks| response_fields::join_texts(blocks, Some("text")))
            .unwrap_or_default();

        if !joined.is_empty() {
            return Ok(joined);
        }

        response_fields::text_at(body, "/content/0/text")
            .map(str::to_string)
            .ok_or_else(|| Error::missing_content(Provider::Anthropic, CONTENT_FIELD))
    }

    /// Only `content_block_delta` events carrying a `text_delta` contribute text.
    fn delta(event: &Value) -> Result<Option<String>, Error> {
        let is_text_delta = response_fields::str_at(event, "/type") == Some("content_block_delta")
            && response_fields::str_at(event, "/delta/type") == Some("text_delta");

        if is_text_delta {
            Ok(response_fields::str_at(event, "/delta/text").map(str::to_string))
        } else {
            Ok(None)
        }
    }
}

#[async_trait::async_trait]
impl Adapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, Error> {
        self.complete(request, false).await
    }

    async fn stream_text(&self, request: &GenerationRequest) -> Result<TextStream, Error> {
        let response = self.send(request, false, true).await?;
        Ok(text_chunks(Provider::Anthropic, response, None, Self::delta))
    }

    async fn generate_json(&self, request: &GenerationRequest) -> Result<Value, Error> {
        let text = self.complete(request, true).await?;
        extract_json(&text)
    }
}
