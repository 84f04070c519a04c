mod config;
mod content;
mod search;
mod vector;

pub use config::{
    ChunkingConfig, Config, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_EMBEDDING_URL, DEFAULT_INDEX_NAME, DEFAULT_MAX_METADATA_SIZE, DEFAULT_NAMESPACE,
    DEFAULT_QDRANT_URL, EmbeddingConfig, SearchConfig, VectorDriver, VectorStoreConfig,
};
pub use content::ContentRecord;
pub use search::{OutputFormat, QueryMatch, SearchResults};
pub use vector::{CONTENT_TYPE, ChunkMetadata, VectorRecord, sanitize_metadata};
