//! Error types for the content indexer.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider returned {status}: {body}")]
    ServerError {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("missing embedding provider API key")]
    MissingApiKey,

    #[error("embedding timeout")]
    Timeout,
}

/// Every provider failure is worth another attempt, whatever its status.
impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector index: {0}")]
    ConnectionError(String),

    #[error("index error: {0}")]
    IndexError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("invalid index response: {0}")]
    InvalidResponse(String),

    #[error("vector index client error: {0}")]
    ClientError(String),
}

/// Errors raised by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("vector store used before setup")]
    UninitializedStore,

    #[error("embedding generation failed for batch {batch_index} after {attempts} attempt(s): {source}")]
    EmbeddingGenerationFailed {
        batch_index: usize,
        attempts: u32,
        #[source]
        source: EmbeddingError,
    },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Index failures (writes included) surface as the backend reported them.
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to import operations.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error at line {line}: {source}")]
    JsonParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    ValidationError(String),
}
