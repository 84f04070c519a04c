//! Batched embedding generation with retry and rate limiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::embedding::EmbeddingProvider;
use crate::error::{EmbeddingError, PipelineError};
use crate::models::EmbeddingConfig;
use crate::utils::retry::{RetryConfig, RetryResult, with_retry};

/// Turns chunk text into embedding vectors, one provider batch at a time.
#[derive(Clone)]
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    retry: RetryConfig,
    batch_delay: Duration,
}

impl EmbeddingGenerator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        let retry = RetryConfig::new(config.max_retries)
            .with_initial_delay(Duration::from_millis(config.retry_delay_ms));

        Self {
            provider,
            batch_size: config.batch_size.max(1) as usize,
            retry,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    /// Embed all chunks, preserving order.
    ///
    /// Batches run sequentially with a pause between them. A batch that still
    /// fails after its retries fails the whole call and nothing is returned.
    pub async fn generate(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<&[String]> = chunks.chunks(self.batch_size).collect();
        tracing::info!(
            text_count = chunks.len(),
            batch_count = batches.len(),
            model = self.provider.model(),
            "starting embedding generation"
        );

        let mut embeddings = Vec::with_capacity(chunks.len());

        for (batch_index, batch) in batches.iter().enumerate() {
            tracing::debug!(batch_index, batch_size = batch.len(), "processing batch");

            let result = with_retry(&self.retry, || self.embed_batch(batch)).await;
            match result {
                RetryResult::Success(vectors) => embeddings.extend(vectors),
                RetryResult::Failed {
                    last_error,
                    attempts,
                } => {
                    tracing::error!(
                        batch_index,
                        attempts,
                        error = %last_error,
                        "embedding generation failed"
                    );
                    return Err(PipelineError::EmbeddingGenerationFailed {
                        batch_index,
                        attempts,
                        source: last_error,
                    });
                }
            }

            if batch_index + 1 < batches.len() {
                sleep(self.batch_delay).await;
            }
        }

        tracing::info!(
            total_embeddings = embeddings.len(),
            "embedding generation completed"
        );
        Ok(embeddings)
    }

    /// Embed a search query as a single input, without retries.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, PipelineError> {
        let vectors = self.provider.embed(&[query.to_string()]).await?;
        vectors.into_iter().next().ok_or_else(|| {
            EmbeddingError::InvalidResponse("empty embedding response".to_string()).into()
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let vectors = self.provider.embed(batch).await?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "provider returned {} embeddings for {} inputs",
                vectors.len(),
                batch.len()
            )));
        }
        Ok(vectors)
    }
}
