use anyhow::{Context, Result};
use clap::Args;
use std::time::Instant;

use super::open_store;
use crate::cli::output::{IngestStats, get_formatter};
use crate::models::{Config, ContentRecord, OutputFormat};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(long, required = true, help = "Product page URL")]
    pub url: String,

    #[arg(long, help = "Record id from the content store")]
    pub id: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub price: Option<String>,

    #[arg(long, help = "Main image URL")]
    pub image: Option<String>,

    #[arg(long, help = "Index even if the record is already present")]
    pub force: bool,
}

impl IngestArgs {
    fn into_record(self) -> ContentRecord {
        ContentRecord {
            id: self.id.unwrap_or_default(),
            url: Some(self.url),
            name: self.name,
            description: self.description,
            price: self.price,
            main_image: self.image,
        }
    }
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if args.url.trim().is_empty() {
        anyhow::bail!("--url cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let force = args.force;
    let record = args.into_record();
    let content_id = record.content_id();

    if verbose {
        eprintln!("Content id: {content_id}");
    }

    let store = open_store(&config).await?;
    let mut stats = IngestStats {
        records_total: 1,
        ..Default::default()
    };

    if !force && store.check_duplicate(&record).await?.is_duplicate() {
        stats.records_duplicate = 1;
        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        print!(
            "{}",
            formatter.format_message(&format!(
                "Already indexed: {} ({content_id}). Use --force to re-index.",
                record.label()
            ))
        );
        return Ok(());
    }

    let written = store
        .upsert_data(&record)
        .await
        .with_context(|| format!("failed to index {}", record.label()))?;

    if written == 0 {
        stats.records_empty = 1;
    } else {
        stats.records_indexed = 1;
        stats.vectors_written = written as u64;
    }
    stats.duration_ms = start_time.elapsed().as_millis() as u64;

    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_record() {
        let args = IngestArgs {
            url: "https://shop.test/p/1".to_string(),
            id: None,
            name: Some("Lamp".to_string()),
            description: None,
            price: Some("$5".to_string()),
            image: Some("https://cdn.test/lamp.jpg".to_string()),
            force: false,
        };

        let record = args.into_record();
        assert_eq!(record.id, "");
        assert_eq!(record.url(), Some("https://shop.test/p/1"));
        assert_eq!(record.main_image(), Some("https://cdn.test/lamp.jpg"));
        assert_eq!(
            record.content_id(),
            crate::utils::content_id("https://shop.test/p/1")
        );
    }
}
