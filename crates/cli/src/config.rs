//! Environment configuration for the Gemini client.

use deckgen_core::Error;
use deckgen_gemini::{GeminiConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use std::env;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";

/// Value shipped in `.env.example`.
pub const PLACEHOLDER_KEY: &str = "your_api_key_here";

/// Prefix Google API keys usually carry.
const KEY_PREFIX: &str = "AIza";

/// What is known about a configured API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Missing,
    Placeholder,
    /// Set, but without the usual `AIza` prefix.
    Unusual(String),
    Valid(String),
}

impl KeyStatus {
    pub fn inspect(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => KeyStatus::Missing,
            Some(PLACEHOLDER_KEY) => KeyStatus::Placeholder,
            Some(key) if !key.starts_with(KEY_PREFIX) => KeyStatus::Unusual(key.to_string()),
            Some(key) => KeyStatus::Valid(key.to_string()),
        }
    }

    /// The key, if it can be sent at all.
    pub fn usable_key(&self) -> Option<&str> {
        match self {
            KeyStatus::Unusual(key) | KeyStatus::Valid(key) => Some(key),
            KeyStatus::Missing | KeyStatus::Placeholder => None,
        }
    }
}

/// Build the client configuration from a key and optional overrides.
pub fn gemini_config_from(
    key: Option<&str>,
    model: Option<String>,
    endpoint: Option<String>,
) -> Result<GeminiConfig, Error> {
    let status = KeyStatus::inspect(key);
    let api_key = match status.usable_key() {
        Some(key) => key.to_string(),
        None if status == KeyStatus::Placeholder => {
            return Err(Error::Configuration(format!(
                "{} is still set to the placeholder '{}'",
                API_KEY_VAR, PLACEHOLDER_KEY
            )))
        }
        None => {
            return Err(Error::Configuration(format!(
                "{} is not set; add it to .env",
                API_KEY_VAR
            )))
        }
    };

    if let KeyStatus::Unusual(_) = status {
        log::warn!("{} does not start with '{}'", API_KEY_VAR, KEY_PREFIX);
    }

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    Ok(GeminiConfig::new(api_key)
        .with_model(non_empty(model).unwrap_or_else(|| DEFAULT_MODEL.to_string()))
        .with_endpoint(non_empty(endpoint).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())))
}

/// Read the client configuration from the process environment.
pub fn gemini_config() -> Result<GeminiConfig, Error> {
    let key = env::var(API_KEY_VAR).ok();
    gemini_config_from(
        key.as_deref(),
        env::var(MODEL_VAR).ok(),
        env::var(ENDPOINT_VAR).ok(),
    )
}

/// Show the first 10 and last 4 characters of a key.
///
/// Keys too short to mask that way are hidden entirely.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 14 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
