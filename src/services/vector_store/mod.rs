//! Vector index abstraction layer.
//!
//! This module provides a trait-based abstraction over the hosted vector index
//! backends (Pinecone, Qdrant), selected through configuration. Every backend
//! is scoped to a single index and namespace at construction time.

mod pinecone;
mod qdrant;

pub use pinecone::PineconeIndex;
pub use qdrant::QdrantIndex;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{QueryMatch, VectorDriver, VectorRecord, VectorStoreConfig};

/// Namespace statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub vector_count: u64,
    pub dimension: Option<u32>,
}

/// Abstract trait for vector index operations.
///
/// All backends must implement this trait so the pipeline stays
/// backend-agnostic.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the index is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Statistics for the bound namespace.
    async fn describe(&self) -> Result<IndexStats, VectorStoreError>;

    /// Create the index if it doesn't exist. Returns false when it already did.
    async fn create_index(&self, dimension: u32) -> Result<bool, VectorStoreError>;

    /// Insert or overwrite vectors by id.
    async fn upsert(&self, vectors: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    /// Check whether a vector with this id is stored.
    async fn contains(&self, id: &str) -> Result<bool, VectorStoreError>;

    /// Nearest neighbours of a query vector.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorStoreError>;

    /// Delete every vector whose metadata `contentId` matches.
    async fn delete_by_content_id(&self, content_id: &str) -> Result<(), VectorStoreError>;

    /// Delete every vector in the namespace.
    async fn clear_namespace(&self) -> Result<(), VectorStoreError>;

    /// Index (or collection) name.
    fn index_name(&self) -> &str;

    /// Namespace the backend is scoped to.
    fn namespace(&self) -> &str;
}

/// Create a vector index backend based on configuration.
pub async fn create_backend(
    config: &VectorStoreConfig,
) -> Result<Box<dyn VectorIndex>, VectorStoreError> {
    match config.driver {
        VectorDriver::Pinecone => {
            let backend = PineconeIndex::connect(config).await?;
            Ok(Box::new(backend))
        }
        VectorDriver::Qdrant => {
            let backend = QdrantIndex::new(config)?;
            Ok(Box::new(backend))
        }
    }
}
