use crate::adapter::{Adapter, TextStream};
use crate::providers::{AnthropicAdapter, GeminiAdapter, OpenAIAdapter};
use crate::{ClientConfig, Error, GenerationRequest, Provider};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Routes each request to the adapter for its provider.
///
/// The client holds no per-request state and can be shared freely across
/// tasks. Errors from adapters are returned as-is.
pub struct GenerationClient {
    openai: OpenAIAdapter,
    anthropic: AnthropicAdapter,
    gemini: GeminiAdapter,
}

impl GenerationClient {
    /// Create a client against the production endpoints.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client from environment configuration.
    pub fn from_env() -> Result<Self, Error> {
        Self::with_config(ClientConfig::from_env()?)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, Error> {
        let http = config.http_client()?;

        Ok(Self {
            openai: OpenAIAdapter::new(http.clone(), config.openai_base_url),
            anthropic: AnthropicAdapter::new(http.clone(), config.anthropic_base_url),
            gemini: GeminiAdapter::new(http, config.gemini_base_url),
        })
    }

    /// The adapter serving `provider`.
    pub fn adapter(&self, provider: Provider) -> &dyn Adapter {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }

    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<String, Error> {
        self.adapter(request.provider).generate_text(request).await
    }

    pub async fn stream_text(&self, request: &GenerationRequest) -> Result<TextStream, Error> {
        self.adapter(request.provider).stream_text(request).await
    }

    pub async fn generate_json(&self, request: &GenerationRequest) -> Result<Value, Error> {
        self.adapter(request.provider).generate_json(request).await
    }

    /// Generate JSON and deserialize it into `T`.
    pub async fn generate_json_as<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<T, Error> {
        let value = self.generate_json(request).await?;
        Ok(serde_json::from_value(value)?)
    }
}
