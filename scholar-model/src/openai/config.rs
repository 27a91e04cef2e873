//! Configuration for OpenAI-compatible clients.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Connection settings for an OpenAI-compatible chat endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Optional organization ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Base URL override for compatible servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// How long the client may keep retrying rate-limited or overloaded
    /// requests. `None` sends every request exactly once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_budget: Option<Duration>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("model", &self.model)
            .field("organization_id", &self.organization_id)
            .field("base_url", &self.base_url)
            .field("retry_budget", &self.retry_budget)
            .finish_non_exhaustive()
    }
}

impl OpenAIConfig {
    /// Create a config for the OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), model: model.into(), organization_id: None, base_url: None, retry_budget: None }
    }

    /// Create a config for an OpenAI-compatible server.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    /// Set the organization ID.
    pub fn with_organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization_id = Some(org_id.into());
        self
    }

    /// Set the base URL. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Let the client retry HTTP 429 and 5xx answers for up to `budget`.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = Some(budget);
        self
    }

    /// The base URL requests go to.
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE)
    }
}
