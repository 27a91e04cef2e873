//! Scripted language model for tests and offline demos.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::llm::{Llm, LlmRequest, LlmResponse};

enum Reply {
    Text(String),
    Failure(String),
}

/// A [`Llm`] that plays back scripted replies and records every request.
///
/// Replies are consumed in order. Once the script runs out, the fallback
/// reply is used (`"mock response"` unless overridden).
///
/// ```rust,ignore
/// use scholar_model::{Llm, LlmRequest, MockLlm};
///
/// let llm = MockLlm::new("mock").with_reply("first").with_failure("quota exceeded");
/// assert_eq!(llm.generate(LlmRequest::new("a")).await?.text, "first");
/// assert!(llm.generate(LlmRequest::new("b")).await.is_err());
/// assert_eq!(llm.prompts(), ["a", "b"]);
/// ```
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<Reply>>,
    fallback: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    /// Create a mock with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: "mock response".to_string(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Reply::Text(text.into()));
        self
    }

    /// Queue a failed call.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Reply::Failure(message.into()));
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Prompts of every request received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(&self, reply: Reply) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        let reply = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Text(text)) => Ok(LlmResponse::text(text)),
            Some(Reply::Failure(message)) => Err(ModelError::Api { provider: self.name.clone(), message }),
            None => Ok(LlmResponse::text(self.fallback.clone())),
        }
    }
}
