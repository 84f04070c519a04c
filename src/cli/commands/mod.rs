mod config;
mod delete;
mod import;
mod ingest;
mod init;
mod search;
mod status;

pub use config::ConfigCommand;
pub use delete::DeleteArgs;
pub use import::ImportArgs;
pub use ingest::IngestArgs;
pub use search::SearchArgs;

pub use config::handle_config;
pub use delete::handle_delete;
pub use import::handle_import;
pub use ingest::handle_ingest;
pub use init::handle_init;
pub use search::handle_search;
pub use status::handle_status;

use anyhow::{Context, Result};
use console::style;
use std::sync::Arc;

use crate::models::Config;
use crate::services::{OpenAiEmbeddingClient, VectorStore};

/// Build a vector store bound to the configured index.
async fn open_store(config: &Config) -> Result<VectorStore> {
    let provider = OpenAiEmbeddingClient::new(&config.embedding)
        .context("failed to create embedding client (is OPENAI_API_KEY set?)")?;

    let mut store = VectorStore::new(config, Arc::new(provider));
    let index_name = &config.vector_store.index_name;
    store
        .setup()
        .await
        .with_context(|| format!("failed to connect to index '{}'", index_name))?;
    Ok(store)
}

/// Ask for a y/N confirmation on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    println!("{} [y/N]", style(prompt).yellow());
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
