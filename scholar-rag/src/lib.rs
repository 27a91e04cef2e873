//! # scholar-rag
//!
//! Retrieval building blocks for asking questions about a single document.
//!
//! ## Overview
//!
//! - [`DocumentLoader`] - turns PDF or text bytes into ordered [`Page`]s
//! - [`Chunker`] - splits a [`Document`] into overlapping [`Chunk`]s
//! - [`EmbeddingProvider`] - turns text into vectors
//! - [`VectorIndex`] - exact cosine-similarity search over one document
//! - [`RagPipeline`] - ingest (chunk → embed → index) and retrieve
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scholar_rag::{HashingEmbeddingProvider, PdfLoader, RagConfig, RagPipeline, load_path};
//!
//! let document = load_path(&PdfLoader::new(), "paper.pdf".as_ref())?;
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .build()?;
//!
//! let index = pipeline.ingest(&document).await?;
//! for hit in pipeline.retrieve(&index, "what dataset is used?").await? {
//!     println!("{:.3} {}: {}", hit.score, hit.chunk.pages, hit.chunk.text);
//! }
//! ```
//!
//! ## Features
//!
//! - `openai` - [`openai::OpenAIEmbeddingProvider`] for OpenAI-compatible `/embeddings` endpoints

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod index;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;

pub use chunking::{
    Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATORS, FixedSizeChunker,
    RecursiveChunker, chunk_pages,
};
pub use config::{DEFAULT_TOP_K, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, PAGE_SEPARATOR, Page, PageRange, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::{DEFAULT_HASHING_DIMENSIONS, HashingEmbeddingProvider};
pub use index::{BuildOptions, VectorIndex};
pub use loader::{DocumentLoader, PdfLoader, TextLoader, load_path, loader_for_path};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
