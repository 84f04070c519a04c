mod chunker;
mod content;
mod embedding;
mod generator;
mod pipeline;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use chunker::{TextChunker, estimate_tokens};
pub use content::prepare_text_content;
pub use embedding::{EmbeddingProvider, OpenAiEmbeddingClient};
pub use generator::EmbeddingGenerator;
pub use pipeline::{DEFAULT_TOP_K, DuplicateStatus, VectorStore};
pub use vector_store::{IndexStats, PineconeIndex, QdrantIndex, VectorIndex, create_backend};
