use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::chunker::Chunk;
use crate::error::{AppError, AppResult};
use crate::providers::EmbeddingProvider;

/// One retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// In-memory vector index over one document's chunks.
///
/// Vectors are L2-normalized at build time, so querying is a dot product
/// (equal to cosine similarity on normalized input). Search is a full
/// linear scan: index size is bounded by one document's chunk count, and
/// nothing in the interface precludes swapping in an ANN structure later.
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Calls the provider once per chunk and aborts the whole build on the
    /// first failure or dimension mismatch — a partially embedded index
    /// would silently degrade answers. The cancellation token is checked
    /// between provider calls; a cancelled build returns
    /// [`AppError::Cancelled`] and the caller's previous index (if any) is
    /// untouched, since nothing is replaced until `build` returns.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        cancel: &CancellationToken,
    ) -> AppResult<Self> {
        let mut vectors = Vec::with_capacity(chunks.len());
        let mut dimensions = 0usize;

        for chunk in &chunks {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            let mut vector = provider.embed(&chunk.text).await?;
            if vector.is_empty() {
                return Err(AppError::Embedding(format!(
                    "provider returned an empty vector for chunk {}",
                    chunk.id
                )));
            }
            if dimensions == 0 {
                dimensions = vector.len();
            } else if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "dimension mismatch: chunk {} embedded to {} dims, index has {}",
                    chunk.id,
                    vector.len(),
                    dimensions
                )));
            }
            normalize(&mut vector);
            vectors.push(vector);
            debug!(chunk = chunk.id, total = chunks.len(), "embedded chunk");
        }

        info!(chunks = chunks.len(), dimensions, "vector index built");
        Ok(Self { chunks, vectors, dimensions })
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

    /// Top-k chunks by similarity to a pre-normalized query vector.
    ///
    /// Results are ordered by descending score; equal scores by ascending
    /// chunk id, so retrieval is reproducible. `k` is clamped to at least 1,
    /// and a `k` past the index size returns every chunk.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let k = k.max(1);
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(k + 1);

        for (id, vector) in self.vectors.iter().enumerate() {
            let score = dot_similarity(query_vector, vector).clamp(-1.0, 1.0);
            if !score.is_finite() {
                continue;
            }
            heap.push(HeapEntry { score, id });
            if heap.len() > k {
                heap.pop();
            }
        }

        let mut results: Vec<ScoredChunk> = heap
            .into_iter()
            .map(|entry| ScoredChunk {
                chunk: self.chunks[entry.id].clone(),
                score: entry.score,
            })
            .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        results
    }
}

/// L2-normalize a vector in place. Zero vectors are left as-is, so their
/// similarity against anything is 0 — never a division by zero.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Dot product. On pre-normalized vectors this equals cosine similarity.
pub fn dot_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Min-heap entry for top-k selection: the reversed ordering keeps the
/// lowest score on top; among equal scores the highest id is evicted first,
/// which is what gives ties their ascending-id order.
#[derive(Debug)]
struct HeapEntry {
    score: f32,
    id: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.id == other.id
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.score.partial_cmp(&self.score) {
            Some(Ordering::Equal) | None => other.id.cmp(&self.id),
            Some(ord) => ord,
        }
    }
}
