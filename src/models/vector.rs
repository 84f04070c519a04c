//! Vector records and the metadata stored alongside each chunk.

use serde::{Deserialize, Serialize};

use super::content::ContentRecord;
use crate::utils::{md5_checksum, truncate_chars};

/// Content type tag stored on every vector.
pub const CONTENT_TYPE: &str = "product_info";

const NAME_MAX_CHARS: usize = 256;
const DESCRIPTION_MAX_CHARS: usize = 512;
const SNIPPET_MAX_CHARS: usize = 1000;

// Caps applied when the serialized metadata is over budget.
const SANITIZED_TEXT_CHARS: usize = 1000;
const SANITIZED_SNIPPET_CHARS: usize = 500;
const SANITIZED_DESCRIPTION_CHARS: usize = 200;

/// Metadata attached to a single chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub text: String,
    pub text_snippet: String,
    pub content_type: String,
    pub timestamp: String,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
}

impl ChunkMetadata {
    pub fn build(
        record: &ContentRecord,
        content_id: &str,
        chunk: &str,
        chunk_index: u32,
        total_chunks: u32,
    ) -> Self {
        Self {
            url: record.url().map(str::to_string),
            name: record.name().map(|n| truncate_chars(n, NAME_MAX_CHARS)),
            content_id: content_id.to_string(),
            chunk_index,
            total_chunks,
            description: record
                .description()
                .map(|d| truncate_chars(d, DESCRIPTION_MAX_CHARS)),
            price: record.price().map(str::to_string),
            text: chunk.to_string(),
            text_snippet: truncate_chars(chunk, SNIPPET_MAX_CHARS),
            content_type: CONTENT_TYPE.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checksum: md5_checksum(chunk),
            main_image: record.main_image().map(str::to_string),
        }
    }

    /// Size of the JSON encoding in bytes.
    pub fn serialized_size(&self) -> usize {
        serde_json::to_vec(self).map_or(usize::MAX, |bytes| bytes.len())
    }
}

/// Shrink metadata whose JSON encoding exceeds `max_bytes`.
///
/// The chunk text is cut to 1000 characters, the snippet to 500 and the
/// description to 200. Everything else is kept as is, so oversized url, price
/// or image fields can leave the result above `max_bytes`. That case is
/// logged and the metadata is returned anyway.
pub fn sanitize_metadata(metadata: ChunkMetadata, max_bytes: usize) -> ChunkMetadata {
    let original_size = metadata.serialized_size();
    if original_size <= max_bytes {
        return metadata;
    }

    let sanitized = ChunkMetadata {
        text: truncate_chars(&metadata.text, SANITIZED_TEXT_CHARS),
        text_snippet: truncate_chars(&metadata.text_snippet, SANITIZED_SNIPPET_CHARS),
        description: metadata
            .description
            .as_deref()
            .map(|d| truncate_chars(d, SANITIZED_DESCRIPTION_CHARS)),
        ..metadata
    };

    let new_size = sanitized.serialized_size();
    if new_size > max_bytes {
        tracing::warn!(
            content_id = %sanitized.content_id,
            chunk_index = sanitized.chunk_index,
            original_size,
            new_size,
            max_size = max_bytes,
            "metadata still over size limit after sanitizing"
        );
    } else {
        tracing::warn!(
            content_id = %sanitized.content_id,
            chunk_index = sanitized.chunk_index,
            original_size,
            new_size,
            max_size = max_bytes,
            "metadata too large, sanitized"
        );
    }

    sanitized
}

/// Unit of storage in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl VectorRecord {
    pub fn vector_id(content_id: &str, chunk_index: usize) -> String {
        format!("{}_{}", content_id, chunk_index)
    }
}
