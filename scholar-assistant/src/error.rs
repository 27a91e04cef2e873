//! Error types for the `scholar-assistant` crate.

use scholar_model::ModelError;
use scholar_rag::RagError;
use thiserror::Error;

/// Errors surfaced to the presentation layer.
///
/// Messages never include credentials or prompt text. No operation retries
/// internally, and a failed call leaves session memory and index untouched.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// A parameter is out of range or a required component is missing.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No document is indexed, or an index was built from zero chunks.
    #[error("No document content is indexed")]
    EmptyIndex,

    /// The polishing style is unknown or has nothing to work with.
    #[error("Unknown polishing style: {0}")]
    UnknownStyle(String),

    /// The language model failed, timed out or returned nothing.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// The embedding provider failed during indexing or retrieval.
    #[error("Embedding failed ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The document could not be read or parsed.
    #[error("Failed to load {format} document: {message}")]
    DocumentLoad {
        /// The document format being loaded.
        format: String,
        /// A description of the failure.
        message: String,
    },
}

impl From<RagError> for AssistantError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidConfig(message) => Self::InvalidConfig(message),
            RagError::EmptyIndex => Self::EmptyIndex,
            RagError::EmbeddingFailure { provider, message } => {
                Self::EmbeddingFailure { provider, message }
            }
            RagError::DocumentLoad { format, message } => Self::DocumentLoad { format, message },
            RagError::Io(e) => Self::DocumentLoad { format: "file".to_string(), message: e.to_string() },
        }
    }
}

impl From<ModelError> for AssistantError {
    fn from(err: ModelError) -> Self {
        Self::GenerationFailure(err.to_string())
    }
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_errors_map_one_to_one() {
        assert!(matches!(AssistantError::from(RagError::EmptyIndex), AssistantError::EmptyIndex));
        assert!(matches!(
            AssistantError::from(RagError::InvalidConfig("x".into())),
            AssistantError::InvalidConfig(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(AssistantError::from(RagError::Io(io)), AssistantError::DocumentLoad { .. }));
    }

    #[test]
    fn model_errors_become_generation_failures() {
        let err = AssistantError::from(ModelError::Api {
            provider: "OpenAI".into(),
            message: "rate limited".into(),
        });
        assert!(matches!(err, AssistantError::GenerationFailure(ref m) if m.contains("rate limited")));
    }
}
