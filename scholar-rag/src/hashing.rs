//! Deterministic offline embedding provider.
//!
//! [`HashingEmbeddingProvider`] maps text to a vector by hashing character
//! unigrams and bigrams into a fixed number of buckets (the "hashing trick").
//! It needs no network or model files, which makes it useful for tests, demos
//! and offline use. Texts sharing many characters score high under cosine
//! similarity; it carries no semantic knowledge beyond that.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default number of hash buckets.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// An [`EmbeddingProvider`] based on feature hashing of character n-grams.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::new(64)?;
/// let v = provider.embed("retrieval").await?;
/// assert_eq!(v.len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfig`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::InvalidConfig(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let chars: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
        let mut vector = vec![0.0f32; self.dimensions];

        let mut add = |feature: &[char]| {
            let hash = fnv1a(feature);
            let bucket = (hash % self.dimensions as u64) as usize;
            // The top bit picks the sign, which keeps collisions from only ever adding up.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        };

        for window in chars.windows(1) {
            add(window);
        }
        for window in chars.windows(2) {
            add(window);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: DEFAULT_HASHING_DIMENSIONS }
    }
}

fn fnv1a(feature: &[char]) -> u64 {
    let mut hash = FNV_OFFSET;
    for c in feature {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        // Separator so ("ab") and ("a","b") differ.
        hash ^= 0xff;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &str {
        "Hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(HashingEmbeddingProvider::new(0), Err(RagError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn embeddings_are_deterministic_and_normalized() {
        let provider = HashingEmbeddingProvider::new(128).unwrap();
        let a = provider.embed("Vector search over papers").await.unwrap();
        let b = provider.embed("Vector search over papers").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn similar_texts_score_higher_than_unrelated_ones() {
        let provider = HashingEmbeddingProvider::default();
        let query = provider.embed("量化神经网络").await.unwrap();
        let close = provider.embed("本文提出量化神经网络").await.unwrap();
        let far = provider.embed("weather forecast tomorrow").await.unwrap();
        assert!(cosine(&query, &close) > cosine(&query, &far));
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let provider = HashingEmbeddingProvider::new(8).unwrap();
        let v = provider.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn batch_matches_single_embeddings() {
        let provider = HashingEmbeddingProvider::new(32).unwrap();
        let batch = provider.embed_batch(&["alpha", "beta"]).await.unwrap();
        assert_eq!(batch[0], provider.embed("alpha").await.unwrap());
        assert_eq!(batch[1], provider.embed("beta").await.unwrap());
    }
}
