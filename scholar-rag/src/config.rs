//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS};
use crate::error::{RagError, Result};
use crate::index::{BuildOptions, DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_EMBEDDING_CONCURRENCY};

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunk boundaries, highest priority first. `""` means "cut anywhere".
    pub separators: Vec<String>,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum similarity score for results; `None` keeps everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Chunks per embedding call while building an index.
    pub embedding_batch_size: usize,
    /// Concurrent embedding calls while building an index.
    pub embedding_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: None,
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            embedding_concurrency: DEFAULT_EMBEDDING_CONCURRENCY,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_batch_size == 0` or `embedding_concurrency == 0`
    pub fn validate(&self) -> Result<()> {
        crate::chunking::validate_sizes(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::InvalidConfig("top_k must be greater than zero".to_string()));
        }
        if self.embedding_batch_size == 0 || self.embedding_concurrency == 0 {
            return Err(RagError::InvalidConfig(
                "embedding_batch_size and embedding_concurrency must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Index build options derived from this config.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            batch_size: self.embedding_batch_size,
            concurrency: self.embedding_concurrency,
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Replace the separator list.
    pub fn separators(mut self, separators: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set how many chunks are embedded per provider call.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set how many provider calls may run at once while building an index.
    pub fn embedding_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embedding_concurrency = concurrency;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_paper_reading_setup() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.separators.first().map(String::as_str), Some("\n"));
        assert_eq!(config.separators.last().map(String::as_str), Some(""));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_overlap_at_least_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_top_k() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        assert!(RagConfig::builder().embedding_concurrency(0).build().is_err());
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = RagConfig::builder()
            .chunk_size(200)
            .chunk_overlap(20)
            .separators(["\n\n", ""])
            .top_k(3)
            .similarity_threshold(0.25)
            .embedding_batch_size(8)
            .embedding_concurrency(2)
            .build()
            .unwrap();
        assert_eq!(config.separators, vec!["\n\n".to_string(), String::new()]);
        assert_eq!(config.similarity_threshold, Some(0.25));
        assert_eq!(config.build_options(), BuildOptions { batch_size: 8, concurrency: 2 });
    }

    #[test]
    fn serde_round_trip_omits_missing_threshold() {
        let json = serde_json::to_string(&RagConfig::default()).unwrap();
        assert!(!json.contains("similarity_threshold"));
        let back: RagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RagConfig::default());
    }
}
