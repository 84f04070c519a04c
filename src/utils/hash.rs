//! Hashing helpers for content addressing and chunk checksums.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest for a content id.
pub const CONTENT_ID_LEN: usize = 16;

/// Derive the deterministic content id for a source string.
pub fn content_id(source: &str) -> String {
    let hash = Sha256::digest(source.as_bytes());
    let mut id = hex::encode(hash);
    id.truncate(CONTENT_ID_LEN);
    id
}

/// Calculate the MD5 checksum of chunk text.
pub fn md5_checksum(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}
