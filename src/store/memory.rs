//! In-memory vector store driver.
//!
//! The reference semantic backend: documents held in memory with their
//! embeddings, searched by cosine distance. The embedder is a trait seam
//! so production can load a real model (`embeddings` feature) while the
//! default path stays deterministic and dependency-free.

use crate::adapter::{DriverError, ScoredDocument, VectorDriver, VectorQuery};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Embedding dimensionality of the hashing embedder.
const HASH_EMBEDDER_DIMS: usize = 256;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model error: {0}")]
    Model(String),
}

/// Text-to-vector seam for the memory driver.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Deterministic hashing embedder.
///
/// Buckets character trigrams into a fixed-width vector and L2-normalizes.
/// No model download, stable across runs, and shared trigrams between
/// query and document still produce meaningful cosine ordering. Works for
/// CJK text since it operates on chars, not whitespace tokens.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            dims: HASH_EMBEDDER_DIMS,
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dims];
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.is_empty() {
            return Ok(vector);
        }
        // Unigrams keep very short queries non-degenerate.
        for window_len in [1usize, 3] {
            if chars.len() < window_len {
                continue;
            }
            for window in chars.windows(window_len) {
                let mut hash: u64 = 1469598103934665603;
                for c in window {
                    hash ^= *c as u64;
                    hash = hash.wrapping_mul(1099511628211);
                }
                vector[(hash % self.dims as u64) as usize] += 1.0;
            }
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    // Vectors are normalized at insert/query time; dot product suffices.
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

struct StoredDocument {
    id: String,
    text: String,
    metadata: serde_json::Value,
    embedding: Vec<f32>,
}

/// In-memory vector driver.
pub struct MemoryVectorDriver {
    embedder: Arc<dyn Embedder>,
    documents: RwLock<Vec<StoredDocument>>,
}

impl MemoryVectorDriver {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Driver with the deterministic hashing embedder.
    pub fn with_hash_embedder() -> Self {
        Self::new(Arc::new(HashEmbedder::new()))
    }

    /// Embed and store one document. Metadata fields named after entity
    /// kinds (`brand`, `series`, `model`, `persona`) drive entity filtering.
    pub fn add_document(
        &self,
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Result<(), DriverError> {
        let text = text.into();
        let embedding = self
            .embedder
            .embed(&text)
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;
        self.documents
            .write()
            .map_err(|_| DriverError::Unavailable("vector store lock poisoned".into()))?
            .push(StoredDocument {
                id: id.into(),
                text,
                metadata,
                embedding,
            });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether any metadata value matches one of the filter names.
fn metadata_matches(metadata: &serde_json::Value, filter: &[String]) -> bool {
    let Some(map) = metadata.as_object() else {
        return false;
    };
    map.values()
        .filter_map(|v| v.as_str())
        .any(|v| filter.iter().any(|name| name == v))
}

#[async_trait]
impl VectorDriver for MemoryVectorDriver {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<ScoredDocument>, DriverError> {
        let query_embedding = self
            .embedder
            .embed(&query.text)
            .map_err(|e| DriverError::Unavailable(e.to_string()))?;

        let documents = self
            .documents
            .read()
            .map_err(|_| DriverError::Unavailable("vector store lock poisoned".into()))?;

        let mut scored: Vec<ScoredDocument> = documents
            .iter()
            .filter(|doc| {
                query.entity_filter.is_empty()
                    || metadata_matches(&doc.metadata, &query.entity_filter)
            })
            .map(|doc| ScoredDocument {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query_embedding, &doc.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(query.limit);
        Ok(scored)
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_embedder::FastembedEmbedder;

#[cfg(feature = "embeddings")]
mod fastembed_embedder {
    use super::{EmbedError, Embedder};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Real-model embedder. Loads lazily on first use; the model handle is
    /// not `Sync`, hence the mutex.
    pub struct FastembedEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastembedEmbedder {
        pub fn new() -> Result<Self, EmbedError> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
            )
            .map_err(|e| EmbedError::Model(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastembedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbedError::Model("embedder lock poisoned".into()))?;
            let mut vectors = model
                .embed(vec![text.to_string()], None)
                .map_err(|e| EmbedError::Model(e.to_string()))?;
            vectors
                .pop()
                .ok_or_else(|| EmbedError::Model("model returned no vector".into()))
        }
    }
}
