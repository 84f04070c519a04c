use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;
pub const DEFAULT_INDEX_NAME: &str = "web-scraper-index-three";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_MAX_METADATA_SIZE: usize = 40960;

const APP_DIR: &str = "content-indexer";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is the common case
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override file values with environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.embedding.url = url;
        }
        if let Some(driver) = get("VECTOR_DRIVER")
            && let Ok(driver) = driver.parse()
        {
            self.vector_store.driver = driver;
        }
        if let Some(key) = get("PINECONE_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(name) = get("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = name;
        }
        if let Some(namespace) = get("PINECONE_NAMESPACE") {
            self.vector_store.namespace = namespace;
        }
        if let Some(host) = get("PINECONE_HOST") {
            self.vector_store.url = Some(host);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.max_retries must be at least 1".to_string(),
            ));
        }
        if self.vector_store.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "vector_store.batch_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.max_tokens == 0 || self.chunking.max_chunks == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.max_tokens and chunking.max_chunks must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    60
}

fn default_embedding_batch_size() -> u32 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_batch_delay_ms() -> u64 {
    200
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_timeout(),
            batch_size: default_embedding_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Pinecone,
    Qdrant,
}

impl std::str::FromStr for VectorDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(VectorDriver::Pinecone),
            "qdrant" => Ok(VectorDriver::Qdrant),
            _ => Err(format!("unknown vector driver: {}", s)),
        }
    }
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Pinecone => write!(f, "pinecone"),
            VectorDriver::Qdrant => write!(f, "qdrant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    /// Pinecone index host or Qdrant URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_upsert_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_upsert_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_max_metadata_size")]
    pub max_metadata_size: usize,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_upsert_batch_size() -> u32 {
    100
}

fn default_upsert_delay_ms() -> u64 {
    100
}

fn default_max_metadata_size() -> usize {
    DEFAULT_MAX_METADATA_SIZE
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl VectorStoreConfig {
    /// Endpoint to connect to, falling back to the driver default.
    pub fn endpoint(&self) -> Option<String> {
        match (&self.url, self.driver) {
            (Some(url), _) => Some(url.clone()),
            (None, VectorDriver::Qdrant) => Some(DEFAULT_QDRANT_URL.to_string()),
            (None, VectorDriver::Pinecone) => None,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: None,
            index_name: default_index_name(),
            namespace: default_namespace(),
            api_key: None,
            batch_size: default_upsert_batch_size(),
            batch_delay_ms: default_upsert_delay_ms(),
            max_metadata_size: default_max_metadata_size(),
            cloud: default_cloud(),
            region: default_region(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,

    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_max_tokens() -> usize {
    512
}

fn default_overlap_tokens() -> usize {
    50
}

fn default_min_chunk_size() -> usize {
    100
}

fn default_max_chunks() -> usize {
    500
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap_tokens: default_overlap_tokens(),
            min_chunk_size: default_min_chunk_size(),
            max_chunks: default_max_chunks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_limit() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_format: OutputFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.url, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.vector_store.index_name, DEFAULT_INDEX_NAME);
        assert_eq!(config.vector_store.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.vector_store.driver, VectorDriver::Pinecone);
    }

    #[test]
    fn test_pipeline_defaults() {
        let config = Config::default();
        assert_eq!(config.embedding.batch_size, 20);
        assert_eq!(config.embedding.max_retries, 3);
        assert_eq!(config.embedding.retry_delay_ms, 1000);
        assert_eq!(config.embedding.batch_delay_ms, 200);
        assert_eq!(config.vector_store.batch_size, 100);
        assert_eq!(config.vector_store.batch_delay_ms, 100);
        assert_eq!(config.vector_store.max_metadata_size, 40960);
        assert_eq!(config.chunking.max_tokens, 512);
        assert_eq!(config.chunking.overlap_tokens, 50);
        assert_eq!(config.chunking.min_chunk_size, 100);
        assert_eq!(config.chunking.max_chunks, 500);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.is_some());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [vector_store]
            driver = "qdrant"
            namespace = "products"
            "#,
        )
        .unwrap();
        assert_eq!(config.vector_store.driver, VectorDriver::Qdrant);
        assert_eq!(config.vector_store.namespace, "products");
        assert_eq!(config.vector_store.batch_size, 100);
        assert_eq!(config.embedding.batch_size, 20);
        assert_eq!(
            config.vector_store.endpoint().as_deref(),
            Some(DEFAULT_QDRANT_URL)
        );
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("PINECONE_INDEX_NAME", "catalog"),
            ("PINECONE_NAMESPACE", "shop"),
            ("PINECONE_HOST", "https://catalog-abc.svc.pinecone.io"),
            ("VECTOR_DRIVER", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vector_store.api_key.as_deref(), Some("pc-test"));
        assert_eq!(config.vector_store.index_name, "catalog");
        assert_eq!(config.vector_store.namespace, "shop");
        assert_eq!(
            config.vector_store.endpoint().as_deref(),
            Some("https://catalog-abc.svc.pinecone.io")
        );
        assert_eq!(config.vector_store.driver, VectorDriver::Pinecone);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.vector_store.namespace = "saved".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.vector_store.namespace, "saved");
        assert!(loaded.embedding.api_key.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.embedding.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_driver_parse() {
        assert_eq!("Qdrant".parse::<VectorDriver>(), Ok(VectorDriver::Qdrant));
        assert!("redis".parse::<VectorDriver>().is_err());
    }
}
