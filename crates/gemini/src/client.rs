//! `TextCompletion` implementation backed by Gemini.

use crate::wire::{GenerateRequest, GenerateResponse};
use deckgen_core::{CompletionError, GenerationParams, TextCompletion};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL the `models/...` path is appended to.
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the `generateContent` call for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

// Keeps the key out of logs.
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Blocking Gemini client.
#[derive(Debug)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, CompletionError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }
}

impl TextCompletion for GeminiClient {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, CompletionError> {
        let url = self.config.generate_url();
        log::debug!(
            "POST {} ({} prompt chars, max {} tokens)",
            url,
            prompt.chars().count(),
            params.max_output_tokens
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateRequest::new(prompt, params))
            .send()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        log::debug!("Response status: {}", status);
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response
            .json()
            .map_err(|e| CompletionError::Transport(format!("unreadable response body: {}", e)))?;
        reply.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_custom_endpoint_and_model() {
        let config = GeminiConfig::new("key")
            .with_endpoint("http://localhost:8080/v1/")
            .with_model("gemini-1.5-flash");
        assert_eq!(
            config.generate_url(),
            "http://localhost:8080/v1/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let config = GeminiConfig::new("AIzaSecretValue");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("AIzaSecretValue"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        // Bind and release a loopback port so nothing listens on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = GeminiConfig::new("key")
            .with_endpoint(format!("http://127.0.0.1:{}", port))
            .with_timeout(Duration::from_secs(5));
        let client = GeminiClient::new(config).unwrap();
        let err = client.complete("hi", &GenerationParams::PING).unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)));
    }
}
