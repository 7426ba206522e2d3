//! In-memory similarity index over embedded chunks.
//!
//! Built fresh for every question and dropped afterwards. Search is an exhaustive
//! scan, which is plenty for the few hundred chunks a single PDF produces.

use std::fmt;
use std::str::FromStr;

use pdfqa_core::ConfigError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::document::splitter::Chunk;
use crate::embedding::{embed_in_batches, Embedder, EmbeddingError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from zero chunks")]
    Empty,

    #[error("got {embeddings} embeddings for {chunks} chunks")]
    CountMismatch { chunks: usize, embeddings: usize },

    #[error("vector dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// How query vectors are compared with stored vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// L2 distance, reported as relevance `1 - d/√2`.
    #[default]
    Euclidean,
    Cosine,
}

impl DistanceMetric {
    /// Similarity score, higher is closer.
    pub fn similarity(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => 1.0 - euclidean(a, b) / std::f32::consts::SQRT_2,
            DistanceMetric::Cosine => cosine_similarity(a, b),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            _ => Err(ConfigError::Invalid {
                key: "RETRIEVAL_METRIC",
                value: s.to_string(),
                reason: "expected 'l2' or 'cosine'".to_string(),
            }),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Euclidean => write!(f, "l2"),
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity. Returns 0.0 when either vector has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Pair precomputed embeddings with their chunks.
    pub fn from_embeddings(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        metric: DistanceMetric,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }
        if chunks.len() != vectors.len() {
            return Err(IndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: vectors.len(),
            });
        }
        let dimensions = vectors[0].len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: dimensions,
                actual: bad.len(),
            });
        }
        Ok(Self {
            chunks,
            vectors,
            dimensions,
            metric,
        })
    }

    /// Embed every chunk and index the results.
    pub async fn build(
        embedder: &dyn Embedder,
        chunks: Vec<Chunk>,
        metric: DistanceMetric,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = embed_in_batches(embedder, &texts, batch_size).await?;
        let index = Self::from_embeddings(chunks, vectors, metric)?;
        info!(
            "Indexed {} chunks ({} dims, metric={})",
            index.len(),
            index.dimensions,
            index.metric
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The `min(k, len)` chunks most similar to `query`, best first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, self.metric.similarity(query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    /// Embed `query` and return its `k` nearest chunks.
    pub async fn retrieve(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let mut vectors = embedder.embed_batch(&[query]).await?;
        let query_vector = vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })?;
        let results = self.search(&query_vector, k)?;
        debug!("Retrieved {} of {} chunks for query", results.len(), self.len());
        Ok(results)
    }
}
