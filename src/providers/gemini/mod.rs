//! Google Gemini backend, reached through the native generateContent API.

pub mod client;
pub mod types;

pub use client::GeminiAdapter;
