//! Generative model client module.
//!
//! A trait-based abstraction over multimodal providers, with Google's
//! Generative Language API (Gemini) as the primary implementation.
//!
//! The only request shape needed is "one image + one prompt in, schema-shaped
//! JSON out", so the types here model exactly that.

mod error;
mod gemini;

pub use error::{classify_http_status, LlmError, LlmErrorKind, RetryConfig};
pub use gemini::{GeminiClient, DEFAULT_API_BASE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inline image payload (base64, no data-URI header).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// A structured-generation request: image + instruction + output schema.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    /// System-level instruction describing the task
    pub system_instruction: String,
    /// User-turn text sent alongside the image
    pub prompt: String,
    pub image: InlineImage,
    /// Output schema the response must conform to
    pub response_schema: serde_json::Value,
    /// Sampling temperature (None = provider default)
    pub temperature: Option<f64>,
}

/// Response from a structured-generation call.
#[derive(Debug, Clone, Default)]
pub struct StructuredResponse {
    /// Concatenated text of the first candidate. `None` when the provider returned no content.
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub model: Option<String>,
}

/// Token usage information (if provided by the upstream provider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a usage object ensuring `total_tokens` is consistent.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Trait for vision-capable structured-generation clients.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Send one structured-generation request.
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Result<StructuredResponse, LlmError>;
}
