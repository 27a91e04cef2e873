//! Error types for the `scholar-model` crate.

use thiserror::Error;

/// Errors returned by language model providers.
///
/// Messages never contain API keys or prompt text.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The client or request configuration is invalid.
    #[error("Invalid model configuration: {0}")]
    Config(String),

    /// The provider rejected the request or could not be reached.
    #[error("{provider} API error: {message}")]
    Api {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider answered without any text.
    #[error("{provider} returned an empty response")]
    EmptyResponse {
        /// The provider that produced the empty response.
        provider: String,
    },
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
