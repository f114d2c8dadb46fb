use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::QaConfig;
use crate::document::Document;
use crate::error::{AppError, AppResult};
use crate::providers::{AnswerGenerator, EmbeddingProvider};
use crate::rag::{assemble, chunk_text, retrieve, VectorIndex};

/// Snapshot of the currently loaded document, for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub text_chars: usize,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub loaded_at: String,
}

struct LoadedDocument {
    document: Document,
    index: VectorIndex,
    stats: DocumentStats,
}

/// One Q&A session over at most one document.
///
/// Owns the configuration, the provider handles, and the current document
/// with its vector index — there is no global state. `load_document` takes
/// `&mut self` and `ask` takes `&self`, so the borrow checker enforces the
/// one-interaction-at-a-time model: no question can run against an index
/// that is being replaced.
pub struct QaSession {
    config: QaConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
    loaded: Option<LoadedDocument>,
}

impl QaSession {
    pub fn new(
        config: QaConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config, embedder, generator, loaded: None })
    }

    /// Chunk and embed a document, replacing whatever was loaded before.
    ///
    /// The new index is built completely before the swap: on any failure or
    /// cancellation the previously loaded document (if any) stays intact
    /// and queryable.
    pub async fn load_document(
        &mut self,
        text: String,
        cancel: &CancellationToken,
    ) -> AppResult<DocumentStats> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyDocument);
        }

        let document = Document::from_text(text);
        let chunks = chunk_text(&document.text, self.config.chunk_size, self.config.chunk_overlap)?;
        if chunks.is_empty() {
            return Err(AppError::EmptyDocument);
        }
        info!(
            chunks = chunks.len(),
            chars = document.char_len(),
            title = document.title.as_deref().unwrap_or("<unknown>"),
            "embedding document"
        );

        let index = VectorIndex::build(chunks, self.embedder.as_ref(), cancel).await?;

        let stats = DocumentStats {
            title: document.title.clone(),
            authors: document.authors.clone(),
            text_chars: document.char_len(),
            chunk_count: index.len(),
            dimensions: index.dimensions(),
            loaded_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };
        self.loaded = Some(LoadedDocument { document, index, stats: stats.clone() });
        Ok(stats)
    }

    /// Answer a question from the loaded document.
    pub async fn ask(&self, question: &str) -> AppResult<String> {
        let loaded = self.loaded.as_ref().ok_or(AppError::DocumentNotLoaded)?;

        let results = retrieve(
            question,
            &loaded.index,
            self.embedder.as_ref(),
            self.config.top_k,
        )
        .await?;
        let context = assemble(&results, self.config.context_budget);
        debug!(
            retrieved = results.len(),
            context_chars = context.chars().count(),
            "assembled context"
        );

        self.generator.generate(question, &context).await
    }

    /// Drop the loaded document and its index.
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    pub fn document(&self) -> Option<&Document> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn stats(&self) -> Option<&DocumentStats> {
        self.loaded.as_ref().map(|l| &l.stats)
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Embeds each text to a tiny deterministic vector derived from its
    /// length, optionally failing on demand to model an unreachable server.
    struct ScriptedProvider {
        fail_embeddings: AtomicBool,
    }

    impl ScriptedProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self { fail_embeddings: AtomicBool::new(false) })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            if self.fail_embeddings.load(Ordering::SeqCst) {
                return Err(AppError::Embedding("provider unreachable".into()));
            }
            let len = text.chars().count() as f32;
            Ok(vec![len, 1.0])
        }
    }

    #[async_trait]
    impl AnswerGenerator for ScriptedProvider {
        async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
            Ok(format!("Q[{question}] CTX[{context}]"))
        }
    }

    fn session_with(provider: Arc<ScriptedProvider>, config: QaConfig) -> QaSession {
        QaSession::new(config, provider.clone(), provider).unwrap()
    }

    fn small_config() -> QaConfig {
        QaConfig { chunk_size: 40, chunk_overlap: 8, top_k: 2, context_budget: 200 }
    }

    const TEXT: &str = "Retrieval quality depends on chunking. \
                        Overlap preserves context at boundaries. \
                        Cosine similarity ranks candidate passages.";

    #[tokio::test]
    async fn test_load_then_ask_round_trip() {
        let provider = ScriptedProvider::new();
        let mut session = session_with(provider, small_config());

        let stats = session
            .load_document(TEXT.to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(stats.chunk_count >= 2);
        assert_eq!(stats.dimensions, 2);
        assert_eq!(stats.text_chars, TEXT.chars().count());

        let answer = session.ask("How are passages ranked?").await.unwrap();
        assert!(answer.starts_with("Q[How are passages ranked?]"));
        assert!(answer.contains("CTX["));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_construction() {
        let provider = ScriptedProvider::new();
        let config = QaConfig { chunk_size: 10, chunk_overlap: 10, ..Default::default() };
        assert!(matches!(
            QaSession::new(config, provider.clone(), provider),
            Err(AppError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let provider = ScriptedProvider::new();
        let mut session = session_with(provider, small_config());
        let result = session
            .load_document("   \n\t  ".to_string(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::EmptyDocument)));
        assert!(session.stats().is_none());
    }

    #[tokio::test]
    async fn test_ask_without_document_fails() {
        let provider = ScriptedProvider::new();
        let session = session_with(provider, small_config());
        assert!(matches!(
            session.ask("anything?").await,
            Err(AppError::DocumentNotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_document() {
        let provider = ScriptedProvider::new();
        let mut session = session_with(provider.clone(), small_config());

        session
            .load_document(TEXT.to_string(), &CancellationToken::new())
            .await
            .unwrap();
        let chunk_count = session.stats().unwrap().chunk_count;

        provider.fail_embeddings.store(true, Ordering::SeqCst);
        let result = session
            .load_document("A completely different paper body.".to_string(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AppError::Embedding(_))));

        // The first document is still loaded and answerable.
        provider.fail_embeddings.store(false, Ordering::SeqCst);
        assert_eq!(session.stats().unwrap().chunk_count, chunk_count);
        assert!(session.ask("still there?").await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_load_keeps_previous_document() {
        let provider = ScriptedProvider::new();
        let mut session = session_with(provider, small_config());

        session
            .load_document(TEXT.to_string(), &CancellationToken::new())
            .await
            .unwrap();
        let loaded_at = session.stats().unwrap().loaded_at.clone();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = session
            .load_document("Replacement paper text.".to_string(), &cancel)
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(session.stats().unwrap().loaded_at, loaded_at);
    }

    #[tokio::test]
    async fn test_clear_discards_document() {
        let provider = ScriptedProvider::new();
        let mut session = session_with(provider, small_config());
        session
            .load_document(TEXT.to_string(), &CancellationToken::new())
            .await
            .unwrap();
        session.clear();
        assert!(session.document().is_none());
        assert!(matches!(
            session.ask("gone?").await,
            Err(AppError::DocumentNotLoaded)
        ));
    }
}
