//! Request and response bodies of `generateContent`.

use deckgen_core::{CompletionError, GenerationParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

impl<'a> GenerateRequest<'a> {
    /// A single-turn user prompt.
    pub fn new(prompt: &'a str, params: &GenerationParams) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    pub fn into_text(self) -> Result<String, CompletionError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::EmptyReply);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest::new("Hello", &GenerationParams::DECK);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        let config = &body["generationConfig"];
        assert_eq!(config["topK"], 40);
        assert_eq!(config["maxOutputTokens"], 8192);
        assert!((config["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_omitted_when_unset() {
        let request = GenerateRequest::new("x", &GenerationParams::ENHANCE);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body["generationConfig"].get("topK").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_text_parts_are_concatenated() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "```json\n{"}, {"text": "}\n```"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 12}
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "```json\n{}\n```");
    }

    #[test]
    fn test_blocked_reply_is_empty() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(matches!(response.into_text(), Err(CompletionError::EmptyReply)));

        let response: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "OTHER"}})).unwrap();
        assert!(matches!(response.into_text(), Err(CompletionError::EmptyReply)));
    }
}
