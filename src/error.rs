use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("Document contains no extractable text")]
    EmptyDocument,
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("No document loaded")]
    DocumentNotLoaded,
    #[error("Operation cancelled")]
    Cancelled,
}

impl serde::Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
