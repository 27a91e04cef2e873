//! Error types for the `scholar-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, chunking, embedding or indexing documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunker or pipeline parameters are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An index was requested from zero chunks.
    #[error("Cannot build an index from zero chunks")]
    EmptyIndex,

    /// The embedding provider failed or returned unusable vectors.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The source document could not be read or parsed.
    #[error("Failed to load {format} document: {message}")]
    DocumentLoad {
        /// The document format being loaded (`pdf`, `text`).
        format: String,
        /// A description of the failure.
        message: String,
    },

    /// Reading the document from disk failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    pub(crate) fn embedding(provider: &str, message: impl Into<String>) -> Self {
        Self::EmbeddingFailure { provider: provider.to_string(), message: message.into() }
    }

    pub(crate) fn load(format: &str, message: impl Into<String>) -> Self {
        Self::DocumentLoad { format: format.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
