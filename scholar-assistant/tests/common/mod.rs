//! Test doubles shared by the integration tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use scholar_rag::{EmbeddingProvider, HashingEmbeddingProvider, RagError};

/// Hashing embeddings until [`OutageEmbedder::go_down`] is called; every call
/// fails afterwards.
#[derive(Debug, Default)]
pub struct OutageEmbedder {
    inner: HashingEmbeddingProvider,
    down: AtomicBool,
}

impl OutageEmbedder {
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RagError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingFailure {
                provider: "outage".to_string(),
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OutageEmbedder {
    fn name(&self) -> &str {
        "outage"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.check()?;
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        self.check()?;
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
