//! The generation capability shared by every language model provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Sampling temperature, `0.0..=2.0`. `None` uses the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens. `None` uses the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerateConfig {
    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Check the parameters are in range.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] for a temperature outside `0.0..=2.0`
    /// or a zero token limit.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ModelError::Config(format!("temperature {t} is outside 0.0..=2.0")));
            }
        }
        if self.max_output_tokens == Some(0) {
            return Err(ModelError::Config("max_output_tokens must be greater than zero".into()));
        }
        Ok(())
    }
}

/// A single-prompt generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The full prompt, sent as one user message.
    pub prompt: String,
    /// Optional sampling parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateConfig>,
}

impl LlmRequest {
    /// Create a request with provider-default sampling.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), config: None }
    }

    /// Attach sampling parameters.
    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the generated text.
    pub completion_tokens: u32,
}

/// The generated text and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, never empty.
    pub text: String,
    /// Why generation stopped, as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Token usage, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl LlmResponse {
    /// A response carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), finish_reason: None, usage: None }
    }
}

/// A text generation service.
///
/// Implementations are swappable behind `Arc<dyn Llm>`; callers depend only
/// on this trait. Dropping the returned future cancels the call.
#[async_trait]
pub trait Llm: Send + Sync {
    /// The model name, used in logs.
    fn name(&self) -> &str;

    /// Generate a completion for `request`.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}
