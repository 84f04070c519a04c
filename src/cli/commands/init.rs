use anyhow::{Context, Result};

use super::open_store;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

/// Create the configured index if it doesn't exist yet.
pub async fn handle_init(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    if verbose {
        eprintln!(
            "Ensuring index '{}' ({} dimensions, cosine)",
            config.vector_store.index_name, config.embedding.dimension
        );
    }

    let store = open_store(&config).await?;
    let created = store
        .create_index()
        .await
        .context("failed to create index")?;

    let message = if created {
        format!(
            "Created index '{}' with dimension {}",
            config.vector_store.index_name, config.embedding.dimension
        )
    } else {
        format!("Index '{}' already exists", config.vector_store.index_name)
    };
    print!("{}", formatter.format_message(&message));

    Ok(())
}
