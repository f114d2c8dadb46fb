use tracing::debug;

use super::index::{normalize, ScoredChunk, VectorIndex};
use crate::error::{AppError, AppResult};
use crate::providers::EmbeddingProvider;

/// Embed a question and return the top-k most similar chunks.
///
/// Ranking policy lives entirely in [`VectorIndex::query`]; this function
/// only obtains the question embedding (surfacing provider failures rather
/// than degrading to empty context) and hands the result back unchanged.
pub async fn retrieve(
    question: &str,
    index: &VectorIndex,
    provider: &dyn EmbeddingProvider,
    k: usize,
) -> AppResult<Vec<ScoredChunk>> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let mut query_vector = provider.embed(question).await?;
    if query_vector.len() != index.dimensions() {
        return Err(AppError::Embedding(format!(
            "question embedded to {} dims, index has {}",
            query_vector.len(),
            index.dimensions()
        )));
    }
    normalize(&mut query_vector);

    let results = index.query(&query_vector, k);
    debug!(
        k,
        returned = results.len(),
        top_score = ?results.first().map(|r| r.score),
        "retrieved chunks"
    );
    Ok(results)
}
