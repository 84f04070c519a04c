pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::PipelineError;
pub use models::{Config, ContentRecord, OutputFormat};
pub use services::{DuplicateStatus, VectorStore};
