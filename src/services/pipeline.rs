//! Ingestion pipeline: record → text → chunks → embeddings → vector index.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::chunker::TextChunker;
use super::content::prepare_text_content;
use super::embedding::EmbeddingProvider;
use super::generator::EmbeddingGenerator;
use super::vector_store::{IndexStats, VectorIndex, create_backend};
use crate::error::PipelineError;
use crate::models::{
    ChunkMetadata, Config, ContentRecord, QueryMatch, VectorRecord, VectorStoreConfig,
    sanitize_metadata,
};

/// Default number of matches returned by a similarity search.
pub const DEFAULT_TOP_K: u32 = 10;

/// Outcome of a duplicate probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateStatus {
    /// The first chunk of the record is already indexed.
    Duplicate,
    Unique,
    /// The index could not be queried.
    Unknown,
}

impl DuplicateStatus {
    /// Whether ingestion can be skipped. An unknown status never blocks it.
    pub fn is_duplicate(self) -> bool {
        matches!(self, DuplicateStatus::Duplicate)
    }
}

/// Orchestrates ingestion and queries against one index namespace.
pub struct VectorStore {
    config: VectorStoreConfig,
    dimension: u32,
    chunker: TextChunker,
    generator: EmbeddingGenerator,
    index: Option<Box<dyn VectorIndex>>,
}

impl VectorStore {
    /// Create an unbound store. Call [`VectorStore::setup`] before use.
    pub fn new(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config: config.vector_store.clone(),
            dimension: config.embedding.dimension,
            chunker: TextChunker::new(&config.chunking),
            generator: EmbeddingGenerator::new(provider, &config.embedding),
            index: None,
        }
    }

    /// Connect to the configured index and namespace.
    pub async fn setup(&mut self) -> Result<(), PipelineError> {
        let index = create_backend(&self.config).await?;
        tracing::info!(
            driver = %self.config.driver,
            index_name = index.index_name(),
            namespace = index.namespace(),
            "vector store ready"
        );
        self.index = Some(index);
        Ok(())
    }

    /// Bind an already constructed backend.
    pub fn bind(&mut self, index: Box<dyn VectorIndex>) {
        self.index = Some(index);
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    fn index(&self) -> Result<&dyn VectorIndex, PipelineError> {
        self.index.as_deref().ok_or(PipelineError::UninitializedStore)
    }

    /// Index a content record. Returns the number of vectors written.
    ///
    /// Content too sparse to chunk is a normal outcome and returns 0 without
    /// touching the index. Write failures are returned as is; batches already
    /// written stay in the index.
    pub async fn upsert_data(&self, record: &ContentRecord) -> Result<usize, PipelineError> {
        let index = self.index()?;
        let content_id = record.content_id();

        let text = prepare_text_content(record);
        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            tracing::warn!(
                content_id = %content_id,
                text_length = text.chars().count(),
                "no chunks produced, skipping"
            );
            return Ok(0);
        }

        let embeddings = self.generator.generate(&chunks).await?;

        let total_chunks = chunks.len() as u32;
        let vectors: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, values))| {
                let metadata =
                    ChunkMetadata::build(record, &content_id, chunk, i as u32, total_chunks);
                VectorRecord {
                    id: VectorRecord::vector_id(&content_id, i),
                    values,
                    metadata: sanitize_metadata(metadata, self.config.max_metadata_size),
                }
            })
            .collect();

        let written = self.write_batches(index, vectors).await?;
        tracing::info!(
            content_id = %content_id,
            chunk_count = chunks.len(),
            vectors_written = written,
            "content indexed"
        );
        Ok(written)
    }

    async fn write_batches(
        &self,
        index: &dyn VectorIndex,
        vectors: Vec<VectorRecord>,
    ) -> Result<usize, PipelineError> {
        let batch_size = self.config.batch_size.max(1) as usize;
        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let batch_count = vectors.len().div_ceil(batch_size);

        let mut written = 0;
        let mut remaining = vectors.into_iter().peekable();
        let mut batch_index = 0;

        while remaining.peek().is_some() {
            let batch: Vec<VectorRecord> = remaining.by_ref().take(batch_size).collect();
            let size = batch.len();
            tracing::debug!(batch_index, batch_count, batch_size = size, "upserting batch");

            index.upsert(batch).await?;
            written += size;
            batch_index += 1;

            if remaining.peek().is_some() {
                sleep(delay).await;
            }
        }

        Ok(written)
    }

    /// Probe the index for the first chunk of this record.
    pub async fn check_duplicate(
        &self,
        record: &ContentRecord,
    ) -> Result<DuplicateStatus, PipelineError> {
        let index = self.index()?;
        let content_id = record.content_id();
        let probe = VectorRecord::vector_id(&content_id, 0);

        let status = match index.contains(&probe).await {
            Ok(true) => DuplicateStatus::Duplicate,
            Ok(false) => DuplicateStatus::Unique,
            Err(e) => {
                tracing::warn!(
                    content_id = %content_id,
                    error = %e,
                    "duplicate check failed, assuming unique"
                );
                DuplicateStatus::Unknown
            }
        };
        tracing::debug!(content_id = %content_id, ?status, "duplicate check");
        Ok(status)
    }

    /// Nearest chunks to a free-text query, metadata included.
    pub async fn similarity_search(
        &self,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<QueryMatch>, PipelineError> {
        let index = self.index()?;
        let vector = self.generator.embed_query(query).await?;
        let matches = index.query(vector, top_k, true).await?;
        tracing::debug!(top_k, match_count = matches.len(), "similarity search");
        Ok(matches)
    }

    /// Remove every chunk of a content record from the namespace.
    pub async fn delete_document(&self, content_id: &str) -> Result<(), PipelineError> {
        self.index()?.delete_by_content_id(content_id).await?;
        tracing::info!(content_id, "content deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<IndexStats, PipelineError> {
        Ok(self.index()?.describe().await?)
    }

    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        Ok(self.index()?.health_check().await?)
    }

    /// Delete every vector in the namespace.
    pub async fn clear(&self) -> Result<(), PipelineError> {
        let index = self.index()?;
        index.clear_namespace().await?;
        tracing::info!(namespace = index.namespace(), "namespace cleared");
        Ok(())
    }

    /// Create the index with the configured dimension. Returns false if it
    /// already existed.
    pub async fn create_index(&self) -> Result<bool, PipelineError> {
        let index = self.index()?;
        let created = index.create_index(self.dimension).await?;
        tracing::info!(
            index_name = index.index_name(),
            dimension = self.dimension,
            created,
            "index ensured"
        );
        Ok(created)
    }
}
