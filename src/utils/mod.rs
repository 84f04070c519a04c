//! Utility modules.

pub mod hash;
pub mod retry;
pub mod text;

pub use hash::{content_id, md5_checksum};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use text::{non_empty, truncate_chars};
