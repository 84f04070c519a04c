use anyhow::Result;
use console::style;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::create_backend;

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (vector_store_connected, vector_count, dimension) =
        match create_backend(&config.vector_store).await {
            Ok(index) => {
                let connected = index.health_check().await.unwrap_or(false);
                match index.describe().await {
                    Ok(stats) if connected => (true, stats.vector_count, stats.dimension),
                    Ok(_) => (false, 0, None),
                    Err(e) => {
                        if verbose {
                            eprintln!("Index stats unavailable: {e}");
                        }
                        (false, 0, None)
                    }
                }
            }
            Err(e) => {
                if verbose {
                    eprintln!("Connection failed: {e}");
                }
                (false, 0, None)
            }
        };

    let embedding_configured = config
        .embedding
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());

    let status = StatusInfo {
        embedding_model: config.embedding.model.clone(),
        embedding_url: config.embedding.url.clone(),
        embedding_configured,
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_endpoint: config.vector_store.endpoint(),
        vector_store_connected,
        index_name: config.vector_store.index_name.clone(),
        namespace: config.vector_store.namespace.clone(),
        vector_count,
        dimension,
    };

    print!("{}", formatter.format_status(&status));

    if !embedding_configured || !vector_store_connected {
        eprintln!();
        if !embedding_configured {
            eprintln!(
                "{} OPENAI_API_KEY is not set. Ingest and search need it.",
                style("Hint:").cyan()
            );
        }
        if !vector_store_connected {
            match config.vector_store.driver {
                VectorDriver::Pinecone => {
                    eprintln!(
                        "{} Pinecone not reachable. Check PINECONE_API_KEY and run `cindex init` if the index is missing.",
                        style("Warning:").yellow()
                    );
                }
                VectorDriver::Qdrant => {
                    eprintln!(
                        "{} Qdrant not running. Start with: docker run -p 6334:6334 qdrant/qdrant",
                        style("Warning:").yellow()
                    );
                }
            }
        }
    }

    Ok(())
}
