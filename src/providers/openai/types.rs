use serde::Serialize;

/// Chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Structured output switch.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    pub r#type: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            r#type: "json_object",
        }
    }
}
