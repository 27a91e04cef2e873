//! In-memory vector index using cosine similarity.
//!
//! A [`VectorIndex`] holds the chunks of one document together with their
//! embeddings. It is built once (full rebuild per document) and is immutable
//! afterwards, so it can be shared as `Arc<VectorIndex>` between concurrent
//! readers. Replacing the index for a new document means building a fresh one
//! and swapping the `Arc`; the old vectors are dropped with the last reference.

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default number of chunk texts sent to the embedding provider per call.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;

/// Default number of embedding calls in flight while building.
pub const DEFAULT_EMBEDDING_CONCURRENCY: usize = 4;

/// Controls how chunk embeddings are requested while building an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Chunks per `embed_batch` call.
    pub batch_size: usize,
    /// Maximum number of concurrent `embed_batch` calls.
    pub concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_EMBEDDING_BATCH_SIZE, concurrency: DEFAULT_EMBEDDING_CONCURRENCY }
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Provider label on dimension errors raised by [`VectorIndex::query`].
const QUERY_SOURCE: &str = "query";

/// An immutable, exact nearest-neighbour index over one document's chunks.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{VectorIndex, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::default();
/// let index = VectorIndex::build(chunks, &provider).await?;
/// let query = provider.embed("main contribution").await?;
/// let top = index.query(&query, 4)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    /// An index with no chunks. Queries against it return nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embed every chunk with `provider` and build the index.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if `chunks` is empty.
    /// - [`RagError::EmbeddingFailure`] if the provider fails or returns
    ///   vectors that do not line up with the chunks.
    pub async fn build(chunks: Vec<Chunk>, provider: &dyn EmbeddingProvider) -> Result<Self> {
        Self::build_with(chunks, provider, BuildOptions::default()).await
    }

    /// [`build`](Self::build) with explicit batching and concurrency.
    ///
    /// Batches are embedded concurrently but results are kept in chunk order,
    /// so the outcome does not depend on `options`.
    pub async fn build_with(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        options: BuildOptions,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if options.batch_size == 0 || options.concurrency == 0 {
            return Err(RagError::InvalidConfig(
                "embedding batch size and concurrency must be greater than zero".to_string(),
            ));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        debug!(
            provider = provider.name(),
            chunk_count = texts.len(),
            batch_size = options.batch_size,
            concurrency = options.concurrency,
            "embedding chunks"
        );

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(options.batch_size))
            .map(|batch| provider.embed_batch(batch))
            .buffered(options.concurrency)
            .try_collect()
            .await?;
        let embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();

        if embeddings.len() != chunks.len() {
            return Err(RagError::embedding(
                provider.name(),
                format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            ));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(RagError::embedding(
                provider.name(),
                "embeddings have inconsistent or zero dimensions",
            ));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        info!(chunk_count = entries.len(), dimensions, "built vector index");
        Ok(Self { entries, dimensions })
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Scores are cosine similarities. Equal scores are ordered by chunk
    /// ordinal, so the result is deterministic for a given index and query.
    /// Asking for more results than the index holds returns every chunk, and
    /// an empty index returns nothing for any query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingFailure`] if `query` does not have the
    /// index's dimensionality.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RagError::embedding(
                QUERY_SOURCE,
                format!("query embedding has {} dimensions, index has {}", query.len(), self.dimensions),
            ));
        }

        let mut scored: Vec<(f32, &IndexEntry)> =
            self.entries.iter().map(|e| (cosine_similarity(&e.embedding, query), e)).collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa).then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchResult { chunk: entry.chunk.clone(), score })
            .collect())
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimensionality, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The document the chunks belong to, if any.
    pub fn document_id(&self) -> Option<&str> {
        self.entries.first().map(|e| e.chunk.document_id.as_str())
    }

    /// Indexed chunks in ordinal order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::document::PageRange;

    /// Returns a fixed vector per text, looked up by the text itself.
    struct TableEmbedder {
        table: Vec<(&'static str, Vec<f32>)>,
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        fn name(&self) -> &str {
            "Table"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.table
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| RagError::embedding("Table", format!("unknown text '{text}'")))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn chunk(ordinal: usize, text: &str) -> Chunk {
        Chunk {
            document_id: "doc".into(),
            ordinal,
            text: text.into(),
            pages: PageRange { first: 0, last: 0 },
        }
    }

    fn embedder() -> TableEmbedder {
        TableEmbedder {
            table: vec![
                ("east", vec![1.0, 0.0]),
                ("north", vec![0.0, 1.0]),
                ("north-east", vec![1.0, 1.0]),
                ("also east", vec![2.0, 0.0]),
            ],
        }
    }

    #[tokio::test]
    async fn build_rejects_zero_chunks() {
        let err = VectorIndex::build(Vec::new(), &embedder()).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
    }

    #[tokio::test]
    async fn build_surfaces_embedding_failures() {
        let err = VectorIndex::build(vec![chunk(0, "west")], &embedder()).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingFailure { .. }));
    }

    #[tokio::test]
    async fn query_orders_by_descending_similarity() {
        let chunks = vec![chunk(0, "north"), chunk(1, "north-east"), chunk(2, "east")];
        let index = VectorIndex::build(chunks, &embedder()).await.unwrap();

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(order, ["east", "north-east", "north"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ties_are_broken_by_ordinal() {
        let chunks = vec![chunk(0, "north"), chunk(1, "also east"), chunk(2, "east")];
        let index = VectorIndex::build(chunks, &embedder()).await.unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        let ordinals: Vec<usize> = results.iter().map(|r| r.chunk.ordinal).collect();
        assert_eq!(ordinals, [1, 2]);
    }

    #[tokio::test]
    async fn k_larger_than_index_returns_all_chunks() {
        let chunks = vec![chunk(0, "north"), chunk(1, "east")];
        let index = VectorIndex::build(chunks, &embedder()).await.unwrap();
        assert_eq!(index.query(&[1.0, 1.0], 10).unwrap().len(), 2);
        assert!(index.query(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn small_batches_and_concurrency_preserve_chunk_order() {
        let chunks = vec![chunk(0, "north"), chunk(1, "east"), chunk(2, "north-east")];
        let options = BuildOptions { batch_size: 1, concurrency: 3 };
        let index = VectorIndex::build_with(chunks, &embedder(), options).await.unwrap();

        let ordinals: Vec<usize> = index.chunks().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, [0, 1, 2]);
        assert_eq!(index.query(&[0.0, 1.0], 1).unwrap()[0].chunk.text, "north");
        assert_eq!(index.dimensions(), 2);
        assert_eq!(index.document_id(), Some("doc"));
    }

    #[test]
    fn empty_index_returns_no_results() {
        let index = VectorIndex::empty();
        assert!(index.is_empty());
        assert!(index.query(&[1.0, 0.0], 5).unwrap().is_empty());
        assert!(index.query(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_of_wrong_dimension_is_rejected() {
        let index = VectorIndex::build(vec![chunk(0, "north"), chunk(1, "east")], &embedder()).await.unwrap();

        let err = index.query(&[1.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, RagError::EmbeddingFailure { .. }));
        assert!(err.to_string().contains("3 dimensions, index has 2"));
        assert!(index.query(&[1.0], 2).is_err());
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
