//! Import command implementation.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::open_store;
use crate::cli::output::{IngestStats, get_formatter};
use crate::error::ImportError;
use crate::models::{Config, ContentRecord, OutputFormat};

/// Arguments for the import command.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to JSON or JSONL file of content records (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Index records even if they are already present
    #[arg(long)]
    pub force: bool,

    /// Only validate the import file without indexing
    #[arg(long)]
    pub validate_only: bool,
}

/// Handle the import command.
pub async fn handle_import(args: ImportArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let input = read_input(args.file.as_deref())?;
    let records = parse_records(&input)?;

    if records.is_empty() {
        print!(
            "{}",
            formatter.format_message("No records found in input.")
        );
        return Ok(());
    }

    validate_records(&records)?;

    if verbose || args.validate_only {
        eprintln!("Found {} records to import", records.len());
    }

    if args.validate_only {
        print!(
            "{}",
            formatter.format_message(&format!(
                "Validation successful: {} records ready for import",
                records.len()
            ))
        );
        return Ok(());
    }

    let config = Config::load()?;
    let store = open_store(&config).await?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut stats = IngestStats {
        records_total: records.len() as u64,
        ..Default::default()
    };

    for record in &records {
        pb.set_message(record.label().to_string());

        if !args.force && store.check_duplicate(record).await?.is_duplicate() {
            stats.records_duplicate += 1;
            if verbose {
                pb.println(format!("Skipping duplicate: {}", record.label()));
            }
            pb.inc(1);
            continue;
        }

        match store.upsert_data(record).await {
            Ok(0) => stats.records_empty += 1,
            Ok(written) => {
                stats.records_indexed += 1;
                stats.vectors_written += written as u64;
            }
            Err(e) => {
                stats.records_failed += 1;
                pb.println(format!(
                    "{} {}: {}",
                    style("Failed").red(),
                    record.label(),
                    e
                ));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    stats.duration_ms = start_time.elapsed().as_millis() as u64;

    print!("{}", formatter.format_ingest_stats(&stats));

    if stats.records_failed > 0 {
        anyhow::bail!("{} record(s) failed to import", stats.records_failed);
    }

    Ok(())
}

/// Read input from file or stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.to_string_lossy() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parse content records from a JSON array or JSONL.
fn parse_records(input: &str) -> Result<Vec<ContentRecord>, ImportError> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(Vec::new());
    }

    if input.starts_with('[') {
        return serde_json::from_str(input).map_err(|source| ImportError::JsonParseError {
            line: source.line(),
            source,
        });
    }

    let mut records = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ContentRecord =
            serde_json::from_str(line).map_err(|source| ImportError::JsonParseError {
                line: i + 1,
                source,
            })?;
        records.push(record);
    }

    Ok(records)
}

/// Every record needs a URL or an id to derive its content id from.
fn validate_records(records: &[ContentRecord]) -> Result<(), ImportError> {
    let missing: Vec<String> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.url().is_none() && r.id.trim().is_empty())
        .map(|(i, _)| (i + 1).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::ValidationError(format!(
            "record(s) {} have neither url nor id",
            missing.join(", ")
        )))
    }
}
