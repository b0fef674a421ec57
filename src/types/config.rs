use crate::Error;
use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Endpoint and transport configuration shared by all adapters.
///
/// Credentials are not part of the configuration; they travel with each
/// [`GenerationRequest`](crate::GenerationRequest).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    /// Overall deadline per HTTP call. `None` means the client never times out.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables, keeping defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Ok(url) = env::var("ANTHROPIC_BASE_URL") {
            config.anthropic_base_url = url;
        }
        if let Ok(url) = env::var("GEMINI_BASE_URL") {
            config.gemini_base_url = url;
        }
        if let Ok(secs) = env::var("GENERATION_TIMEOUT_SECS") {
            config.timeout = Some(parse_timeout_secs(&secs)?);
        }

        Ok(config)
    }

    pub fn with_openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into();
        self
    }

    pub fn with_anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = url.into();
        self
    }

    pub fn with_gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = url.into();
        self
    }

    /// Point every adapter at the same base URL (used with mock servers).
    pub fn with_base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.with_openai_base_url(url.clone())
            .with_anthropic_base_url(url.clone())
            .with_gemini_base_url(url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the shared HTTP client for this configuration.
    pub(crate) fn http_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

fn parse_timeout_secs(value: &str) -> Result<Duration, Error> {
    let secs: u64 = value.trim().parse().map_err(|_| {
        Error::config(format!(
            "GENERATION_TIMEOUT_SECS must be a whole number of seconds, got '{value}'"
        ))
    })?;
    if secs == 0 {
        return Err(Error::config("GENERATION_TIMEOUT_SECS must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
