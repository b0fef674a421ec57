//! Messages style backend.

pub mod client;
pub mod types;

pub use client::AnthropicAdapter;
