//! Blocking client for the Gemini `generateContent` endpoint.

pub mod client;
pub mod wire;

pub use client::{GeminiClient, GeminiConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT};
