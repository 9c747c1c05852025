use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Capability set of an embedding backend. Implementations must
/// return one vector of [`Embedder::dim`] components per input text,
/// in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn dim(&self) -> usize;
    fn name(&self) -> &str;
}

/// Embedder selection, usually read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub embedder: String,
    pub dim: usize,
}

pub const DEFAULT_EMBEDDER: &str = "hash";
pub const DEFAULT_DIM: usize = 384;

impl EmbeddingConfig {
    /// Read `BV_SEMANTIC_EMBEDDER` and `BV_SEMANTIC_DIM`, falling back
    /// to the deterministic hash embedder at 384 dimensions.
    pub fn from_env() -> Self {
        let embedder = std::env::var("BV_SEMANTIC_EMBEDDER")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDER.to_string());
        let dim = std::env::var("BV_SEMANTIC_DIM")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|&d| d > 0)
            .unwrap_or(DEFAULT_DIM);
        Self { embedder, dim }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedder: DEFAULT_EMBEDDER.to_string(),
            dim: DEFAULT_DIM,
        }
    }
}

/// Instantiate the embedder named by `config`.
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedder.as_str() {
        "hash" => Ok(Arc::new(HashEmbedder::new(config.dim))),
        other => Err(VectorStoreError::EmbedderError(format!(
            "unknown embedder {other:?}"
        ))),
    }
}

/// Index file location for a project root and embedder identity:
/// `<root>/.beads/index/<embedder>-<dim>.bin`.
pub fn default_index_path(project_dir: &Path, config: &EmbeddingConfig) -> PathBuf {
    project_dir
        .join(".beads")
        .join("index")
        .join(format!("{}-{}.bin", config.embedder, config.dim))
}

/// Deterministic offline embedder: token unigrams and bigrams are
/// feature-hashed into `dim` buckets and the result L2-normalised.
/// No model download, stable across runs and platforms.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        for token in &tokens {
            let bucket = (fnv1a64(token.as_bytes()) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            let bucket = (fnv1a64(bigram.as_bytes()) % self.dim as u64) as usize;
            vector[bucket] += 0.5;
        }

        normalize_in_place(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// L2-normalise; zero vectors stay zero.
pub fn normalize_in_place(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

pub(crate) fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 14_695_981_039_346_656_037;
    const PRIME: u64 = 1_099_511_628_211;
    let mut hash = OFFSET;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic_and_normalised() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["graph rendering benchmarks".to_string()];
        let first = embedder.embed(&texts).await.unwrap();
        let second = embedder.embed(&texts).await.unwrap();
        assert_eq!(first, second);

        let norm: f32 = first[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn similar_texts_score_higher_than_unrelated() {
        let embedder = HashEmbedder::new(256);
        let texts = vec![
            "graph rendering benchmarks".to_string(),
            "rendering benchmarks for graphs".to_string(),
            "database migration tooling".to_string(),
        ];
        let vectors = embedder.embed(&texts).await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2]));
    }

    #[test]
    fn unknown_embedder_rejected() {
        let config = EmbeddingConfig {
            embedder: "onnx".to_string(),
            dim: 384,
        };
        assert!(embedder_from_config(&config).is_err());
    }

    #[test]
    fn index_path_encodes_identity() {
        let config = EmbeddingConfig::default();
        let path = default_index_path(Path::new("/tmp/project"), &config);
        assert!(path.ends_with(".beads/index/hash-384.bin"));
    }
}
