//! Qdrant vector index backend implementation.
//!
//! The index name maps to a collection. Namespaces share the collection and
//! are kept apart by a `namespace` payload field.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    Filter, GetPointsBuilder, ListValue, PointId, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value, VectorParamsBuilder, point_id::PointIdOptions, vectors_config,
};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::{IndexStats, VectorIndex};
use crate::error::VectorStoreError;
use crate::models::{DEFAULT_QDRANT_URL, QueryMatch, VectorRecord, VectorStoreConfig};

const VECTOR_ID_FIELD: &str = "vectorId";
const NAMESPACE_FIELD: &str = "namespace";
const CONTENT_ID_FIELD: &str = "contentId";

/// Qdrant vector index backend.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    namespace: String,
}

impl QdrantIndex {
    /// Create a new Qdrant backend from configuration.
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let url = config
            .endpoint()
            .unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string());
        let mut builder = Qdrant::from_url(&url).timeout(Duration::from_secs(config.timeout_secs));

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.index_name.clone(),
            namespace: config.namespace.clone(),
        })
    }

    /// Qdrant point id for a vector id. Stable across runs.
    pub fn point_id(&self, vector_id: &str) -> String {
        point_uuid(&self.namespace, vector_id)
    }

    fn namespace_filter(&self) -> Filter {
        Filter::must([Condition::matches(NAMESPACE_FIELD, self.namespace.clone())])
    }

    fn build_payload(
        &self,
        record: &VectorRecord,
    ) -> Result<HashMap<String, Value>, VectorStoreError> {
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        let mut payload: HashMap<String, Value> = match metadata {
            serde_json::Value::Object(fields) => fields
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
            _ => HashMap::new(),
        };
        payload.insert(VECTOR_ID_FIELD.to_string(), record.id.clone().into());
        payload.insert(NAMESPACE_FIELD.to_string(), self.namespace.clone().into());
        Ok(payload)
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))
    }
}

fn point_uuid(namespace: &str, vector_id: &str) -> String {
    let key = format!("{}:{}", namespace, vector_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn json_to_value(value: serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(fields) => Kind::StructValue(Struct {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        }),
    };
    Value { kind: Some(kind) }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => b.into(),
        Some(Kind::IntegerValue(i)) => i.into(),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Kind::StringValue(s)) => s.into(),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

fn point_id_string(id: Option<PointId>) -> String {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Rebuild a match from a scored point, restoring the original vector id.
fn to_match(
    id: Option<PointId>,
    score: f32,
    mut payload: HashMap<String, Value>,
    include_metadata: bool,
) -> QueryMatch {
    payload.remove(NAMESPACE_FIELD);
    let id = match payload.remove(VECTOR_ID_FIELD).map(|v| v.kind) {
        Some(Some(Kind::StringValue(vector_id))) => vector_id,
        _ => point_id_string(id),
    };

    let metadata = (include_metadata && !payload.is_empty()).then(|| {
        payload
            .into_iter()
            .map(|(k, v)| (k, value_to_json(v)))
            .collect()
    });

    QueryMatch {
        id,
        score,
        metadata,
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn describe(&self) -> Result<IndexStats, VectorStoreError> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        let dimension = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| match v.config {
                Some(vectors_config::Config::Params(params)) => u32::try_from(params.size).ok(),
                _ => None,
            });

        let count = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(self.namespace_filter())
                    .exact(true),
            )
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        Ok(IndexStats {
            vector_count: count.result.map_or(0, |r| r.count),
            dimension,
        })
    }

    async fn create_index(&self, dimension: u32) -> Result<bool, VectorStoreError> {
        if self.collection_exists().await? {
            return Ok(false);
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(u64::from(dimension), Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        Ok(true)
    }

    async fn upsert(&self, vectors: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let points = vectors
            .into_iter()
            .map(|record| {
                let payload = self.build_payload(&record)?;
                Ok(PointStruct::new(
                    self.point_id(&record.id),
                    record.values,
                    payload,
                ))
            })
            .collect::<Result<Vec<PointStruct>, VectorStoreError>>()?;

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool, VectorStoreError> {
        let get = GetPointsBuilder::new(&self.collection, vec![PointId::from(self.point_id(id))])
            .with_payload(false)
            .with_vectors(false);

        let response = self
            .client
            .get_points(get)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        Ok(!response.result.is_empty())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        // The vector id lives in the payload, so it is always fetched.
        let search = SearchPointsBuilder::new(&self.collection, vector, u64::from(top_k))
            .filter(self.namespace_filter())
            .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| to_match(point.id, point.score, point.payload, include_metadata))
            .collect())
    }

    async fn delete_by_content_id(&self, content_id: &str) -> Result<(), VectorStoreError> {
        let filter = Filter::must([
            Condition::matches(NAMESPACE_FIELD, self.namespace.clone()),
            Condition::matches(CONTENT_ID_FIELD, content_id.to_string()),
        ]);
        let delete = DeletePointsBuilder::new(&self.collection)
            .points(filter)
            .wait(true);

        self.client
            .delete_points(delete)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        Ok(())
    }

    async fn clear_namespace(&self) -> Result<(), VectorStoreError> {
        if !self.collection_exists().await? {
            return Ok(());
        }

        let delete = DeletePointsBuilder::new(&self.collection)
            .points(self.namespace_filter())
            .wait(true);

        self.client
            .delete_points(delete)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        Ok(())
    }

    fn index_name(&self) -> &str {
        &self.collection
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, ContentRecord, VectorDriver};

    fn test_index(namespace: &str) -> QdrantIndex {
        let config = VectorStoreConfig {
            driver: VectorDriver::Qdrant,
            namespace: namespace.to_string(),
            ..Default::default()
        };
        QdrantIndex::new(&config).unwrap()
    }

    fn record(id: &str) -> VectorRecord {
        let content = ContentRecord::new("1")
            .with_url("https://shop.test/p/1")
            .with_price("$5");
        VectorRecord {
            id: id.to_string(),
            values: vec![0.1, 0.2],
            metadata: ChunkMetadata::build(&content, "abc", "chunk text", 2, 3),
        }
    }

    #[tokio::test]
    async fn test_collection_is_index_name() {
        let index = test_index("default");
        assert_eq!(index.index_name(), "web-scraper-index-three");
        assert_eq!(index.namespace(), "default");
    }

    #[tokio::test]
    async fn test_point_id_is_stable_uuid() {
        let index = test_index("shop");
        let first = index.point_id("abc_0");

        assert_eq!(first, index.point_id("abc_0"));
        assert_ne!(first, index.point_id("abc_1"));
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn test_point_id_differs_across_namespaces() {
        assert_ne!(
            test_index("shop").point_id("abc_0"),
            test_index("archive").point_id("abc_0")
        );
    }

    #[tokio::test]
    async fn test_payload_carries_metadata_and_scope() {
        let index = test_index("shop");
        let payload = index.build_payload(&record("abc_2")).unwrap();

        assert_eq!(value_to_json(payload["vectorId"].clone()), "abc_2");
        assert_eq!(value_to_json(payload["namespace"].clone()), "shop");
        assert_eq!(value_to_json(payload["contentId"].clone()), "abc");
        assert_eq!(value_to_json(payload["chunkIndex"].clone()), 2);
        assert_eq!(value_to_json(payload["price"].clone()), "$5");
        assert!(!payload.contains_key("mainImage"));
    }

    #[tokio::test]
    async fn test_to_match_restores_vector_id() {
        let index = test_index("shop");
        let payload = index.build_payload(&record("abc_2")).unwrap();
        let point = PointId::from(index.point_id("abc_2"));

        let matched = to_match(Some(point), 0.87, payload, true);
        assert_eq!(matched.id, "abc_2");
        assert_eq!(matched.location(), "https://shop.test/p/1");
        assert_eq!(matched.snippet(), "chunk text");

        let metadata = matched.metadata.unwrap();
        assert!(!metadata.contains_key("vectorId"));
        assert!(!metadata.contains_key("namespace"));
    }

    #[tokio::test]
    async fn test_to_match_without_metadata() {
        let index = test_index("shop");
        let payload = index.build_payload(&record("abc_0")).unwrap();

        let matched = to_match(None, 0.5, payload, false);
        assert_eq!(matched.id, "abc_0");
        assert!(matched.metadata.is_none());
    }

    #[test]
    fn test_value_conversion_nested() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null], "b": {"c": true}});
        assert_eq!(value_to_json(json_to_value(json.clone())), json);
    }
}
