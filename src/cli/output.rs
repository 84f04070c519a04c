use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, SearchResults};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_configured: bool,
    pub vector_store_driver: String,
    pub vector_store_endpoint: Option<String>,
    pub vector_store_connected: bool,
    pub index_name: String,
    pub namespace: String,
    pub vector_count: u64,
    pub dimension: Option<u32>,
}

/// Summary of an ingest or import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub records_total: u64,
    pub records_indexed: u64,
    pub records_duplicate: u64,
    pub records_empty: u64,
    pub records_failed: u64,
    pub vectors_written: u64,
    pub duration_ms: u64,
}

fn preview(text: &str) -> String {
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", cut)
    } else {
        cut
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, result.score).unwrap();
            if let Some(name) = result.metadata_str("name") {
                writeln!(output, "   Name:     {}", name).unwrap();
            }
            writeln!(output, "   Location: {}", result.location()).unwrap();
            if let Some(price) = result.metadata_str("price") {
                writeln!(output, "   Price:    {}", price).unwrap();
            }
            writeln!(output, "   ---").unwrap();
            for line in preview(result.snippet()).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let embedding_status = if status.embedding_configured {
            "[CONFIGURED]"
        } else {
            "[NO API KEY]"
        };
        writeln!(output, "Embedding:     {}", embedding_status).unwrap();
        writeln!(output, "  Model:       {}", status.embedding_model).unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        if let Some(ref endpoint) = status.vector_store_endpoint {
            writeln!(output, "  Endpoint:    {}", endpoint).unwrap();
        }
        writeln!(output, "  Index:       {}", status.index_name).unwrap();
        writeln!(output, "  Namespace:   {}", status.namespace).unwrap();
        if status.vector_store_connected {
            writeln!(output, "  Vectors:     {}", status.vector_count).unwrap();
            if let Some(dimension) = status.dimension {
                writeln!(output, "  Dimension:   {}", dimension).unwrap();
            }
        }

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Records:    {}", stats.records_total).unwrap();
        writeln!(output, "Indexed:    {}", stats.records_indexed).unwrap();
        writeln!(output, "Duplicates: {}", stats.records_duplicate).unwrap();
        writeln!(output, "Too sparse: {}", stats.records_empty).unwrap();
        if stats.records_failed > 0 {
            writeln!(output, "Failed:     {}", stats.records_failed).unwrap();
        }
        writeln!(output, "Vectors:    {}", stats.vectors_written).unwrap();
        writeln!(output, "Duration:   {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(json)
        } else {
            serde_json::to_string(json)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        match serde_json::to_value(results) {
            Ok(json) => self.render(&json),
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "embedding": {
                "model": status.embedding_model,
                "url": status.embedding_url,
                "configured": status.embedding_configured,
            },
            "vector_store": {
                "driver": status.vector_store_driver,
                "endpoint": status.vector_store_endpoint,
                "connected": status.vector_store_connected,
                "index_name": status.index_name,
                "namespace": status.namespace,
                "vector_count": status.vector_count,
                "dimension": status.dimension,
            }
        });
        self.render(&json)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let json = serde_json::json!({
            "records_total": stats.records_total,
            "records_indexed": stats.records_indexed,
            "records_duplicate": stats.records_duplicate,
            "records_empty": stats.records_empty,
            "records_failed": stats.records_failed,
            "vectors_written": stats.vectors_written,
            "duration_ms": stats.duration_ms,
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            let title = result.metadata_str("name").unwrap_or(&result.id);
            writeln!(output, "### {}. {} ({:.3})\n", i + 1, title, result.score).unwrap();
            writeln!(output, "**Location:** <{}>\n", result.location()).unwrap();
            if let Some(price) = result.metadata_str("price") {
                writeln!(output, "**Price:** {}\n", price).unwrap();
            }
            writeln!(output, "> {}\n", preview(result.snippet()).replace('\n', " ")).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let embedding_status = if status.embedding_configured {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Embedding {}\n", embedding_status).unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **URL:** `{}`", status.embedding_url).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(
            output,
            "### Vector Store ({}) {}\n",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        if let Some(ref endpoint) = status.vector_store_endpoint {
            writeln!(output, "- **Endpoint:** `{}`", endpoint).unwrap();
        }
        writeln!(output, "- **Index:** {}", status.index_name).unwrap();
        writeln!(output, "- **Namespace:** {}", status.namespace).unwrap();
        writeln!(output, "- **Vectors:** {}", status.vector_count).unwrap();

        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Ingestion Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Records | {} |", stats.records_total).unwrap();
        writeln!(output, "| Indexed | {} |", stats.records_indexed).unwrap();
        writeln!(output, "| Duplicates | {} |", stats.records_duplicate).unwrap();
        writeln!(output, "| Too sparse | {} |", stats.records_empty).unwrap();
        writeln!(output, "| Failed | {} |", stats.records_failed).unwrap();
        writeln!(output, "| Vectors | {} |", stats.vectors_written).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
