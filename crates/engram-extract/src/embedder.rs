//! Embedding provider trait and a deterministic offline implementation

use async_trait::async_trait;

use crate::extractor::ExtractError;

/// Trait for text embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Dimension of the vectors this provider produces
    fn dimension(&self) -> usize;

    /// Embed a piece of text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ExtractError>;
}

/// Deterministic token-hash embedder.
///
/// Buckets whitespace tokens into a fixed-dimension histogram via FNV-1a and
/// L2-normalizes. Not a semantic model: it exists so ranking works offline
/// and reproducibly; swap in a real provider for production quality.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ExtractError> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let bucket = (fnv1a(token.as_bytes()) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// FNV-1a: stable across runs and platforms, unlike the std hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("paris is the capital of france").await.unwrap();
        let b = embedder.embed("paris is the capital of france").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_embedding_is_normalized() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("some text to embed").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_overlapping_text_scores_higher_than_disjoint() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("capital of france").await.unwrap();
        let close = embedder.embed("paris is the capital of france").await.unwrap();
        let far = embedder.embed("rust borrow checker errors").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("").await.unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
