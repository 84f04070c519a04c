//! Embedding provider client for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// External service turning text into fixed-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every input, returning one vector per input in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Model identifier used for requests.
    fn model(&self) -> &str;
}

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: u32,
}

/// Response from the /embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible embedding endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    dimension: u32,
}

impl OpenAiEmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(EmbeddingError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| EmbeddingError::ConnectionError(format!("invalid API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    /// Get the base URL of the embedding provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError { status, body });
        }

        let mut parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);

        if let Some(bad) = parsed
            .data
            .iter()
            .find(|d| d.embedding.len() != self.dimension as usize)
        {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected dimension {}, got {}",
                self.dimension,
                bad.embedding.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_config(url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            url: url.to_string(),
            api_key: Some("sk-test".to_string()),
            dimension: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = EmbeddingConfig::default();
        assert!(matches!(
            OpenAiEmbeddingClient::new(&config),
            Err(EmbeddingError::MissingApiKey)
        ));
    }

    #[test]
    fn test_base_url_trimming() {
        let client = OpenAiEmbeddingClient::new(&test_config("http://localhost:8080/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
        assert_eq!(client.model(), "text-embedding-3-small");
    }

    #[tokio::test]
    async fn test_embed_orders_by_index() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .header("authorization", "Bearer sk-test")
                    .json_body(json!({
                        "model": "text-embedding-3-small",
                        "input": ["first", "second"],
                        "dimensions": 3
                    }));
                then.status(200).json_body(json!({
                    "data": [
                        {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                        {"index": 0, "embedding": [1.0, 0.0, 0.0]}
                    ]
                }));
            })
            .await;

        let client = OpenAiEmbeddingClient::new(&test_config(&server.base_url())).unwrap();
        let vectors = client
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_embed_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(503).body("overloaded");
            })
            .await;

        let client = OpenAiEmbeddingClient::new(&test_config(&server.base_url())).unwrap();
        let err = client.embed(&["text".to_string()]).await.unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::ServerError { status, ref body }
                if status == reqwest::StatusCode::SERVICE_UNAVAILABLE && body == "overloaded"
        ));
    }

    #[tokio::test]
    async fn test_embed_count_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200)
                    .json_body(json!({"data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]}));
            })
            .await;

        let client = OpenAiEmbeddingClient::new(&test_config(&server.base_url())).unwrap();
        let err = client
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_embed_empty_input_skips_request() {
        let client = OpenAiEmbeddingClient::new(&test_config("http://127.0.0.1:9")).unwrap();
        assert!(client.embed(&[]).await.unwrap().is_empty());
    }
}
