//! Chat-model abstraction and the hosted Gemini adapter.
//!
//! Generation settings are fixed: low temperature, a capped output length, and the dangerous
//! content and sexually explicit safety filters disabled.

mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Sampling temperature passed to the model.
pub const TEMPERATURE: f64 = 0.2;
/// Maximum output tokens requested from the model.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider could not be reached.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate answer: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or carried no text.
    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),
}

/// Filled prompt: a system instruction plus the user's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    /// System instruction carrying the operator prompt, retrieved context, and language.
    pub system: String,
    /// Human turn, the user's message verbatim.
    pub user: String,
}

/// Interface implemented by hosted chat models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a free-text answer for the prompt.
    async fn generate(&self, prompt: ChatPrompt) -> Result<String, LlmError>;
}
