// ============================================
// PAPER QA
// Single-document RAG pipeline: chunk a PDF's
// text, embed it, retrieve by cosine similarity,
// answer with a local Ollama model
// ============================================

pub mod config;
pub mod document;
pub mod error;
pub mod pdf;
pub mod providers;
pub mod rag;
pub mod session;

pub use config::{OllamaConfig, QaConfig};
pub use document::Document;
pub use error::{AppError, AppResult};
pub use providers::{AnswerGenerator, EmbeddingProvider, OllamaClient};
pub use rag::{assemble, chunk_text, retrieve, Chunk, ScoredChunk, VectorIndex};
pub use session::{DocumentStats, QaSession};
