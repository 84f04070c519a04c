//! CLI module for the content indexer.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Index scraped product content into a vector database and search it.
#[derive(Debug, Parser)]
#[command(name = "cindex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check embedding and vector index status
    Status,

    /// Create the vector index if it doesn't exist
    Init,

    /// Index a single content record
    Ingest(commands::IngestArgs),

    /// Import content records from JSON/JSONL files
    Import(commands::ImportArgs),

    /// Search indexed content
    Search(commands::SearchArgs),

    /// Delete indexed content
    Delete(commands::DeleteArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr is implemented in models::search
