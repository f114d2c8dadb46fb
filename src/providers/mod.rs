use async_trait::async_trait;

use crate::error::AppResult;

pub mod ollama;

pub use ollama::OllamaClient;

/// A backend that turns text into a fixed-dimension embedding vector.
///
/// Implementations must be deterministic for identical input and
/// configuration — retrieval results are only reproducible if the provider
/// is. Failures surface as [`crate::error::AppError::Embedding`]; no
/// retries happen at this layer, so callers own any retry policy.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embed a batch of texts.
    ///
    /// The default calls [`embed`](EmbeddingProvider::embed) sequentially;
    /// backends with native batch endpoints should override it.
    async fn embed_batch(&self, texts: &[&str]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// A backend that answers a question given retrieved context.
///
/// The implementation owns prompt construction; callers supply only the
/// question and the assembled context block and impose no format on the
/// returned answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String>;
}
