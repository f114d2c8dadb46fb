use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Chunking and retrieval parameters for one Q&A session.
///
/// Defaults are the operating point that works well for research papers:
/// ~1000-char chunks with 200 chars of overlap, 3 retrieved passages per
/// question, and a 4000-char assembled context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QaConfig {
    /// Maximum chunk length, in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Maximum assembled context size, in characters.
    pub context_budget: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            context_budget: 4000,
        }
    }
}

impl QaConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::InvalidConfiguration(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.context_budget == 0 {
            return Err(AppError::InvalidConfiguration(
                "context_budget must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for an Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    pub base_url: String,
    /// Model used for answer generation.
    pub model: String,
    /// Model used for embeddings.
    pub embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            embedding_model: "nomic-embed-text:latest".into(),
        }
    }
}
