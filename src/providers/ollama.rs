// ============================================
// OLLAMA PROVIDER
// Embeddings + answer generation over the
// local Ollama HTTP API
// ============================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{AnswerGenerator, EmbeddingProvider};
use crate::config::OllamaConfig;
use crate::error::{AppError, AppResult};

const SYSTEM_PROMPT: &str = "You are a research assistant helping to answer questions based on the provided research paper.\n\
Use ONLY the information from the provided context to answer the question.\n\
If the answer cannot be determined from the context, say so clearly.\n\
Do not make up information or rely on prior knowledge.";

// ============================================
// WIRE TYPES
// ============================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TaggedModel>,
}

#[derive(Debug, Deserialize)]
struct TaggedModel {
    name: String,
}

// ============================================
// CLIENT
// ============================================

/// Client for one Ollama server, implementing both provider traits.
///
/// Generation is non-streaming (`stream: false`): answers come back as one
/// JSON body. Embeddings go through `/api/embeddings`, one prompt per call.
pub struct OllamaClient {
    http: reqwest::Client,
    embeddings_url: Url,
    generate_url: Url,
    tags_url: Url,
    model: String,
    embedding_model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> AppResult<Self> {
        // Normalize to a trailing slash so joins append instead of replace.
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            AppError::InvalidConfiguration(format!(
                "invalid Ollama base URL '{}': {e}",
                config.base_url
            ))
        })?;
        let join = |path: &str| {
            base_url.join(path).map_err(|e| {
                AppError::InvalidConfiguration(format!("invalid Ollama endpoint {path}: {e}"))
            })
        };

        Ok(Self {
            http: reqwest::Client::new(),
            embeddings_url: join("api/embeddings")?,
            generate_url: join("api/generate")?,
            tags_url: join("api/tags")?,
            model: config.model,
            embedding_model: config.embedding_model,
        })
    }

    /// Names of the models available on the server.
    pub async fn list_models(&self) -> AppResult<Vec<String>> {
        let response = self
            .http
            .get(self.tags_url.clone())
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("cannot reach Ollama: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "listing models failed with {status}: {body}"
            )));
        }
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("malformed tags response: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Cheap reachability check: the server answers `/api/tags`.
    pub async fn health_check(&self) -> AppResult<()> {
        self.list_models().await.map(|_| ())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

/// The prompt handed to the generation model: retrieved context first, then
/// the question, ending on an answer cue.
fn build_prompt(question: &str, context: &str) -> String {
    format!("Context from research paper:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let request = EmbeddingsRequest { model: &self.embedding_model, prompt: text };
        let response = self
            .http
            .post(self.embeddings_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("cannot reach Ollama: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "embedding request failed with {status}: {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("malformed embedding response: {e}")))?;
        debug!(model = %self.embedding_model, dims = parsed.embedding.len(), "embedded text");
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl AnswerGenerator for OllamaClient {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        let prompt = build_prompt(question, context);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            system: SYSTEM_PROMPT,
            stream: false,
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "generating answer");

        let response = self
            .http
            .post(self.generate_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("cannot reach Ollama: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "generate request failed with {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("malformed generate response: {e}")))?;
        Ok(parsed.response)
    }
}

// ============================================
// TESTS
// ============================================
