//! Pinecone vector index backend over the REST data plane.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use super::{IndexStats, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::{ChunkMetadata, QueryMatch, VectorRecord, VectorStoreConfig};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [PineconeVector<'a>],
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ChunkMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: Vec<f32>,
    top_k: u32,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
    #[serde(default)]
    dimension: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

/// Pinecone vector index backend.
pub struct PineconeIndex {
    client: Client,
    host: Option<String>,
    control_url: String,
    index_name: String,
    namespace: String,
    cloud: String,
    region: String,
}

impl PineconeIndex {
    /// Connect to the configured index, resolving its host if none is set.
    pub async fn connect(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        Self::connect_via(config, CONTROL_PLANE_URL).await
    }

    /// Connect using a specific control plane URL.
    pub async fn connect_via(
        config: &VectorStoreConfig,
        control_url: &str,
    ) -> Result<Self, VectorStoreError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                VectorStoreError::ConnectionError("missing Pinecone API key".to_string())
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key).map_err(|e| {
                VectorStoreError::ConnectionError(format!("invalid Pinecone API key: {}", e))
            })?,
        );
        headers.insert(
            "X-Pinecone-API-Version",
            HeaderValue::from_static(API_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let mut index = Self {
            client,
            host: None,
            control_url: control_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            namespace: config.namespace.clone(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
        };

        index.host = match config.url.as_deref() {
            Some(host) => Some(normalize_host(host)),
            None => index.resolve_host().await?,
        };

        match index.host {
            Some(ref host) => tracing::debug!(
                index_name = %index.index_name,
                host = %host,
                namespace = %index.namespace,
                "pinecone index bound"
            ),
            None => tracing::warn!(
                index_name = %index.index_name,
                "pinecone index not found, only index creation is available"
            ),
        }

        Ok(index)
    }

    /// Data plane host of the bound index, if it exists.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Look up the data plane host. `None` when the index doesn't exist.
    async fn resolve_host(&self) -> Result<Option<String>, VectorStoreError> {
        let url = format!("{}/indexes/{}", self.control_url, self.index_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, VectorStoreError::IndexError).await?;

        let described: DescribeIndexResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        Ok(Some(normalize_host(&described.host)))
    }

    fn data_url(&self, path: &str) -> Result<String, VectorStoreError> {
        let host = self.host.as_deref().ok_or_else(|| {
            VectorStoreError::IndexError(format!(
                "index '{}' does not exist, run `cindex init`",
                self.index_name
            ))
        })?;
        Ok(format!("{}{}", host, path))
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<Response, VectorStoreError> {
        self.client
            .post(self.data_url(path)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check_status(
    response: Response,
    to_error: fn(String) -> VectorStoreError,
) -> Result<Response, VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(to_error(format!("status {}: {}", status, body)))
}

fn transport_error(e: reqwest::Error) -> VectorStoreError {
    if e.is_connect() || e.is_timeout() {
        VectorStoreError::ConnectionError(e.to_string())
    } else {
        VectorStoreError::ClientError(e.to_string())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.describe().await.map(|_| true)
    }

    async fn describe(&self) -> Result<IndexStats, VectorStoreError> {
        let response = self.post("/describe_index_stats", &json!({})).await?;
        let response = check_status(response, VectorStoreError::IndexError).await?;

        let stats: StatsResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        Ok(IndexStats {
            vector_count: stats
                .namespaces
                .get(&self.namespace)
                .map_or(0, |ns| ns.vector_count),
            dimension: stats.dimension,
        })
    }

    async fn create_index(&self, dimension: u32) -> Result<bool, VectorStoreError> {
        let body = json!({
            "name": self.index_name,
            "dimension": dimension,
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });

        let response = self
            .client
            .post(format!("{}/indexes", self.control_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(false);
        }
        check_status(response, VectorStoreError::IndexError).await?;
        Ok(true)
    }

    async fn upsert(&self, vectors: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let payload: Vec<PineconeVector<'_>> = vectors
            .iter()
            .map(|v| PineconeVector {
                id: &v.id,
                values: &v.values,
                metadata: &v.metadata,
            })
            .collect();
        let request = UpsertRequest {
            vectors: &payload,
            namespace: &self.namespace,
        };

        let response = self.post("/vectors/upsert", &request).await?;
        check_status(response, VectorStoreError::UpsertError).await?;
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool, VectorStoreError> {
        let response = self
            .client
            .get(self.data_url("/vectors/fetch")?)
            .query(&[("ids", id), ("namespace", self.namespace.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, VectorStoreError::QueryError).await?;

        let fetched: FetchResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        Ok(fetched.vectors.contains_key(id))
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        let request = QueryRequest {
            namespace: &self.namespace,
            vector,
            top_k,
            include_values: false,
            include_metadata,
        };

        let response = self.post("/query", &request).await?;
        let response = check_status(response, VectorStoreError::QueryError).await?;

        let results: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        Ok(results.matches)
    }

    async fn delete_by_content_id(&self, content_id: &str) -> Result<(), VectorStoreError> {
        let body = json!({
            "namespace": self.namespace,
            "filter": { "contentId": { "$eq": content_id } },
        });

        let response = self.post("/vectors/delete", &body).await?;
        check_status(response, VectorStoreError::DeleteError).await?;
        Ok(())
    }

    async fn clear_namespace(&self) -> Result<(), VectorStoreError> {
        let body = json!({
            "namespace": self.namespace,
            "deleteAll": true,
        });

        let response = self.post("/vectors/delete", &body).await?;
        check_status(response, VectorStoreError::DeleteError).await?;
        Ok(())
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
