//! A unified generation client over multiple LLM backends.
//!
//! This library offers one contract (generate text, stream text, generate JSON)
//! over OpenAI chat completions, the Anthropic Messages API, and Google Gemini.
//! Streaming responses are exposed as pull-based streams, and JSON output is
//! recovered from model text even when it is wrapped in prose or code fences.

pub mod adapter;
pub mod client;
pub mod error;
pub mod json_extract;
pub mod providers;
pub mod response_fields;
pub mod sse_stream;
pub mod types;

// Re-export core types for easy usage
pub use adapter::{Adapter, TextStream};
pub use client::GenerationClient;
pub use error::Error;
pub use json_extract::extract_json;
pub use providers::*;
pub use sse_stream::{SseStream, SseStreamExt};
pub use types::*;
