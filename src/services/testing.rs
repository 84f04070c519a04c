//! In-memory doubles for the embedding provider and vector index.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::embedding::EmbeddingProvider;
use super::vector_store::{IndexStats, VectorIndex};
use crate::error::{EmbeddingError, VectorStoreError};
use crate::models::{QueryMatch, VectorRecord};

/// Deterministic embedding provider that records every call.
pub struct FakeProvider {
    dimension: usize,
    fail_first: usize,
    fail_status: StatusCode,
    drop_last: bool,
    calls: Mutex<Vec<usize>>,
}

impl FakeProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_first: 0,
            fail_status: StatusCode::SERVICE_UNAVAILABLE,
            drop_last: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the first `n` calls with a server error (503 unless overridden).
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Status returned by the failing calls.
    pub fn failure_status(mut self, status: StatusCode) -> Self {
        self.fail_status = status;
        self
    }

    /// Return one vector fewer than requested.
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Input count of every call made, failed ones included.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
        let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        (0..dimension)
            .map(|i| ((seed.wrapping_add(i as u32) % 1000) as f32) / 1000.0)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(inputs.len());
            calls.len()
        };

        if call <= self.fail_first {
            return Err(EmbeddingError::ServerError {
                status: self.fail_status,
                body: "overloaded".to_string(),
            });
        }

        let mut vectors: Vec<Vec<f32>> = inputs
            .iter()
            .map(|text| Self::vector_for(text, self.dimension))
            .collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn model(&self) -> &str {
        "fake-embedding"
    }
}

/// Vector index backed by an in-memory map.
#[derive(Default)]
pub struct FakeIndex {
    vectors: Mutex<BTreeMap<String, VectorRecord>>,
    upserts: Mutex<Vec<usize>>,
    queries: AtomicUsize,
    fail_upsert: bool,
    fail_reads: bool,
    created: Mutex<bool>,
}

impl FakeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upsert.
    pub fn failing_upserts(mut self) -> Self {
        self.fail_upsert = true;
        self
    }

    /// Fail lookups, queries and stats.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn with_records(self, records: Vec<VectorRecord>) -> Self {
        {
            let mut vectors = self.vectors.lock().unwrap();
            for record in records {
                vectors.insert(record.id.clone(), record);
            }
        }
        self
    }

    /// Size of every upsert call.
    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.vectors.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.vectors.lock().unwrap().get(id).cloned()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), VectorStoreError> {
        if self.fail_reads {
            Err(VectorStoreError::ConnectionError("index unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(!self.fail_reads)
    }

    async fn describe(&self) -> Result<IndexStats, VectorStoreError> {
        self.check_reads()?;
        let vectors = self.vectors.lock().unwrap();
        Ok(IndexStats {
            vector_count: vectors.len() as u64,
            dimension: vectors.values().next().map(|v| v.values.len() as u32),
        })
    }

    async fn create_index(&self, _dimension: u32) -> Result<bool, VectorStoreError> {
        let mut created = self.created.lock().unwrap();
        let newly = !*created;
        *created = true;
        Ok(newly)
    }

    async fn upsert(&self, vectors: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        self.upserts.lock().unwrap().push(vectors.len());
        if self.fail_upsert {
            return Err(VectorStoreError::UpsertError("status 400: rejected".to_string()));
        }
        let mut stored = self.vectors.lock().unwrap();
        for record in vectors {
            stored.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool, VectorStoreError> {
        self.check_reads()?;
        Ok(self.vectors.lock().unwrap().contains_key(id))
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;

        let stored = self.vectors.lock().unwrap();
        let mut matches: Vec<QueryMatch> = stored
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: dot(&vector, &record.values),
                metadata: include_metadata
                    .then(|| serde_json::to_value(&record.metadata).ok())
                    .flatten()
                    .and_then(|v| v.as_object().cloned()),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k as usize);
        Ok(matches)
    }

    async fn delete_by_content_id(&self, content_id: &str) -> Result<(), VectorStoreError> {
        self.vectors
            .lock()
            .unwrap()
            .retain(|_, record| record.metadata.content_id != content_id);
        Ok(())
    }

    async fn clear_namespace(&self) -> Result<(), VectorStoreError> {
        self.vectors.lock().unwrap().clear();
        Ok(())
    }

    fn index_name(&self) -> &str {
        "fake-index"
    }

    fn namespace(&self) -> &str {
        "default"
    }
}
