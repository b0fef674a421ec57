use crate::{Error, GenerationRequest, Provider};
use futures_util::stream::BoxStream;
use serde_json::Value;

/// An ordered, pull-based stream of non-empty text chunks.
///
/// Dropping the stream releases the underlying HTTP response.
pub type TextStream = BoxStream<'static, Result<String, Error>>;

/// The three-operation contract every backend implements.
#[async_trait::async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// The backend this adapter talks to.
    fn provider(&self) -> Provider;

    /// Generate a complete text response.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, Error>;

    /// Open a streaming response. The request is sent and its status checked
    /// before this returns; the body is then read as the stream is polled.
    async fn stream_text(&self, request: &GenerationRequest) -> Result<TextStream, Error>;

    /// Ask the backend for structured output and recover a JSON value from it.
    async fn generate_json(&self, request: &GenerationRequest) -> Result<Value, Error>;
}
