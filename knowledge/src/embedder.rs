//! Embedding providers
//!
//! The [`Embedder`] trait is the boundary to whatever model turns text into
//! vectors. [`HashingEmbedder`] is a deterministic, dependency-free
//! implementation used for offline operation and tests: word tokens and
//! character trigrams are hashed into a fixed number of signed buckets and the
//! result is L2-normalized, so cosine distance stays within [0, 2].

use crate::error::{KnowledgeError, Result};
use sha2::{Digest, Sha256};

/// Default vector length (matches common MiniLM-sized sentence models)
pub const DEFAULT_DIMENSION: usize = 384;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Text → fixed-length vector
///
/// Implementations must be deterministic for identical input so that
/// document ids and digests stay stable across ingestion calls.
pub trait Embedder: Send + Sync {
    /// Encode one text into a vector of length [`Embedder::dimension`]
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;
}

/// Feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create embedder with the given vector length
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(KnowledgeError::InvalidArgument(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn features(text: &str) -> Vec<(String, f32)> {
        let lowered = text.to_lowercase();
        let mut features = Vec::new();

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            features.push((format!("w:{}", token), WORD_WEIGHT));
        }

        let collapsed: Vec<char> = lowered
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .collect();
        for window in collapsed.windows(3) {
            let trigram: String = window.iter().collect();
            features.push((format!("c:{}", trigram), TRIGRAM_WEIGHT));
        }

        features
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for (feature, weight) in Self::features(text) {
            let (index, sign) = self.bucket(&feature);
            vector[index] += sign * weight;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
