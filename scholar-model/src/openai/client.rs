//! OpenAI client implementation.

use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig as AsyncOpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use tracing::{debug, error};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse, Usage};

const PROVIDER: &str = "OpenAI";

/// OpenAI client for the standard OpenAI API and OpenAI-compatible APIs.
///
/// Each request is sent as a single user message; responses are not streamed.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    model: String,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient").field("model", &self.model).finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the API key or model is empty.
    ///
    /// Unless [`OpenAIConfig::retry_budget`] is set, every call sends exactly
    /// one request and rate limiting surfaces as [`ModelError::Api`].
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Config("API key must not be empty".into()));
        }
        if config.model.trim().is_empty() {
            return Err(ModelError::Config("model must not be empty".into()));
        }

        let mut openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.effective_base_url());

        if let Some(org_id) = &config.organization_id {
            openai_config = openai_config.with_org_id(org_id);
        }

        // A zero budget makes the first transient error final.
        let backoff = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(config.retry_budget.unwrap_or(Duration::ZERO)))
            .build();

        Ok(Self { client: Client::with_config(openai_config).with_backoff(backoff), model: config.model })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    fn api_error(message: impl std::fmt::Display) -> ModelError {
        ModelError::Api { provider: PROVIDER.to_string(), message: message.to_string() }
    }
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(|e| Self::api_error(format!("failed to build message: {e}")))?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];
        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages);

        if let Some(config) = &request.config {
            config.validate()?;
            if let Some(temp) = config.temperature {
                request_builder.temperature(temp);
            }
            if let Some(max_tokens) = config.max_output_tokens {
                request_builder.max_tokens(max_tokens);
            }
        }

        let openai_request = request_builder
            .build()
            .map_err(|e| Self::api_error(format!("failed to build request: {e}")))?;

        debug!(model = %self.model, prompt_len = request.prompt.chars().count(), "sending chat completion");

        let response = self.client.chat().create(openai_request).await.map_err(|e| {
            error!(model = %self.model, error = %e, "chat completion failed");
            Self::api_error(e)
        })?;

        let usage = response
            .usage
            .map(|u| Usage { prompt_tokens: u.prompt_tokens, completion_tokens: u.completion_tokens });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.to_string() })?;
        let finish_reason = choice.finish_reason.map(|r| format!("{r:?}").to_lowercase());

        let text = choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ModelError::EmptyResponse { provider: PROVIDER.to_string() })?;

        debug!(model = %self.model, answer_len = text.chars().count(), ?usage, "chat completion finished");
        Ok(LlmResponse { text, finish_reason, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenAIClient::new(OpenAIConfig::new("  ", "gpt-3.5-turbo")).unwrap_err();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn name_is_model() {
        let client = OpenAIClient::compatible("key", "http://localhost:1234/v1", "local-model").unwrap();
        assert_eq!(client.name(), "local-model");
        assert!(!format!("{client:?}").contains("key"));
    }
}
