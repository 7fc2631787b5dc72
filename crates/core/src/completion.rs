//! Seam to the generative-text service.

use crate::error::CompletionError;

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    /// Nucleus-sampling cutoff.
    pub top_p: f32,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Creative settings for generating a whole deck.
    pub const DECK: GenerationParams = GenerationParams {
        temperature: 0.8,
        top_p: 0.95,
        top_k: Some(40),
        max_output_tokens: 8192,
    };

    /// Steadier settings for improving a single slide.
    pub const ENHANCE: GenerationParams = GenerationParams {
        temperature: 0.5,
        top_p: 0.8,
        top_k: None,
        max_output_tokens: 1024,
    };

    /// Short reply used to check connectivity.
    pub const PING: GenerationParams = GenerationParams {
        temperature: 0.5,
        top_p: 0.95,
        top_k: None,
        max_output_tokens: 50,
    };
}

/// A configured client that turns a prompt into one raw text reply.
///
/// Calls block until the service answers or fails.
pub trait TextCompletion {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, CompletionError>;
}
