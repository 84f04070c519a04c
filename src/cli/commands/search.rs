use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;

use super::open_store;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, SearchResults};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u32>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let limit = args.limit.unwrap_or(config.search.default_limit);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Limit: {limit}");
        eprintln!(
            "  Index: {} / {}",
            config.vector_store.index_name, config.vector_store.namespace
        );
    }

    let store = open_store(&config).await?;
    let matches = store
        .similarity_search(query, limit)
        .await
        .context("search failed")?;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    if verbose {
        eprintln!("  Total: {duration_ms}ms");
        eprintln!();
    }

    let results = SearchResults::new(query.to_string(), matches, duration_ms);
    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
