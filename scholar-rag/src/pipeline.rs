//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates document ingestion (chunk → embed → index)
//! and retrieval (embed → search → filter) by composing an
//! [`EmbeddingProvider`] and a [`Chunker`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_rag::{HashingEmbeddingProvider, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//!
//! let index = pipeline.ingest(&document).await?;
//! let results = pipeline.retrieve(&index, "what is the main contribution?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. The pipeline is stateless
/// apart from its configuration; each ingest returns a fresh [`VectorIndex`]
/// owned by the caller.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("embedding_provider", &self.embedding_provider.name())
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Ingest a document: chunk → embed → build a new index.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if the document has no text.
    /// - [`RagError::EmbeddingFailure`] if embedding fails.
    pub async fn ingest(&self, document: &Document) -> Result<VectorIndex> {
        let chunks = self.chunker.chunk(document);
        let chunk_count = chunks.len();
        if chunks.is_empty() {
            error!(document.id = %document.id, "document has no text to index");
            return Err(RagError::EmptyIndex);
        }

        let index =
            VectorIndex::build_with(chunks, self.embedding_provider.as_ref(), self.config.build_options())
                .await
                .inspect_err(|e| {
                    error!(document.id = %document.id, error = %e, "index build failed");
                })?;

        info!(
            document.id = %document.id,
            page_count = document.page_count(),
            chunk_count,
            "ingested document"
        );
        Ok(index)
    }

    /// Retrieve the chunks most relevant to `query` from `index`.
    ///
    /// Embeds the query with the same provider used for ingestion, takes the
    /// configured `top_k`, then drops results under `similarity_threshold`.
    /// An empty index yields an empty result without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingFailure`] if embedding fails or the query
    /// vector's dimension differs from the index.
    pub async fn retrieve(&self, index: &VectorIndex, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_top_k(index, query, self.config.top_k).await
    }

    /// [`retrieve`](Self::retrieve) with an explicit `top_k`.
    pub async fn retrieve_top_k(
        &self,
        index: &VectorIndex,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let mut results = index.query(&query_embedding, top_k).map_err(|e| match e {
            RagError::EmbeddingFailure { message, .. } => {
                RagError::embedding(self.embedding_provider.name(), message)
            }
            other => other,
        })?;
        if let Some(threshold) = self.config.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` is required. The config defaults to
/// [`RagConfig::default()`] and the chunker to a [`RecursiveChunker`] built
/// from the config.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if the embedding provider is
    /// missing or the configuration is inconsistent.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::InvalidConfig("embedding_provider is required".to_string())
        })?;

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::new(
                config.chunk_size,
                config.chunk_overlap,
                config.separators.iter().cloned(),
            )?),
        };

        Ok(RagPipeline { config, embedding_provider, chunker })
    }
}
