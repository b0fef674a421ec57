use crate::response_fields;
use crate::types::Provider;
use thiserror::Error;

/// Errors that can occur when generating through any backend.
///
/// Every backend failure is normalized into one of these variants, so callers
/// never need to branch on the provider to understand what went wrong.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or no response arrived.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Backend {
        provider: Provider,
        status: u16,
        message: String,
    },

    /// The response parsed, but the expected content field was absent or empty.
    #[error("{provider} response is missing content at `{field}`")]
    MissingContent {
        provider: Provider,
        field: &'static str,
    },

    #[error("Could not extract JSON from model output: {0}")]
    JsonExtraction(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A streaming body failed after the response had started.
    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn json_extraction(message: impl Into<String>) -> Self {
        Error::JsonExtraction(message.into())
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Error::Stream(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn missing_content(provider: Provider, field: &'static str) -> Self {
        Error::MissingContent { provider, field }
    }

    /// Build a [`Error::Backend`] from a status and the raw response body.
    ///
    /// The message is the body's `error.message` when present, otherwise the
    /// status reason phrase. It is never empty.
    pub fn backend(provider: Provider, status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(response_fields::error_message)
            .map(str::to_string)
            .unwrap_or_else(|| match status.canonical_reason() {
                Some(reason) => reason.to_string(),
                None => format!("HTTP {}", status.as_u16()),
            });

        Error::Backend {
            provider,
            status: status.as_u16(),
            message,
        }
    }

    /// Consume a non-success response and normalize it into [`Error::Backend`].
    pub async fn from_response(provider: Provider, response: reqwest::Response) -> Self {
        let status = response.status();
        // A body that cannot be read still leaves the status to report.
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%provider, status = status.as_u16(), "backend returned an error status");
        Self::backend(provider, status, &body)
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Backend { .. })
    }
}
