//! Backend adapters.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAIAdapter;

use crate::adapter::TextStream;
use crate::response_fields;
use crate::sse_stream::SseStream;
use crate::{Error, Provider};
use futures_util::StreamExt;
use serde_json::Value;

/// Send a request and normalize a non-success status into [`Error::Backend`].
pub(crate) async fn send_checked(
    provider: Provider,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, Error> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(Error::from_response(provider, response).await);
    }

    Ok(response)
}

/// Pulls the text out of one decoded stream frame.
///
/// `Ok(None)` skips the frame; an error ends the stream.
pub(crate) type Delta = fn(&Value) -> Result<Option<String>, Error>;

/// Read a successful response body as untyped JSON.
///
/// A body that is not JSON has no content to read, so it is reported as
/// [`Error::MissingContent`] at `content_field`.
pub(crate) async fn read_json(
    provider: Provider,
    response: reqwest::Response,
    content_field: &'static str,
) -> Result<Value, Error> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(%provider, error = %e, "success response body is not JSON");
        Error::missing_content(provider, content_field)
    })
}

/// Map the SSE frames of a streaming response to text chunks.
///
/// Frames that are not JSON or carry no text are skipped. An in-band `error`
/// object, or an error from `delta`, ends up as an [`Error::Stream`] item.
pub(crate) fn text_chunks(
    provider: Provider,
    response: reqwest::Response,
    sentinel: Option<&'static str>,
    delta: Delta,
) -> TextStream {
    let mut frames = SseStream::new(response.bytes_stream());
    if let Some(sentinel) = sentinel {
        frames = frames.stop_at(sentinel);
    }

    frames
        .filter_map(move |frame| {
            let chunk = match frame {
                Ok(data) => chunk_from_frame(provider, &data, delta),
                Err(e) => Some(Err(e)),
            };
            futures_util::future::ready(chunk)
        })
        .boxed()
}

fn chunk_from_frame(
    provider: Provider,
    data: &str,
    delta: Delta,
) -> Option<Result<String, Error>> {
    if data.is_empty() {
        return None;
    }

    let event: Value = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::trace!(%provider, error = %e, "ignoring unparseable SSE frame");
            return None;
        }
    };

    if let Some(message) = response_fields::error_message(&event) {
        return Some(Err(Error::stream(format!("{provider} stream error: {message}"))));
    }

    match delta(&event) {
        Ok(Some(text)) if !text.is_empty() => Some(Ok(text)),
        Ok(_) => {
            tracing::trace!(%provider, "ignoring SSE frame without text");
            None
        }
        Err(e) => Some(Err(e)),
    }
}
