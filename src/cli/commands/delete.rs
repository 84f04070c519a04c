use anyhow::{Context, Result};
use clap::Args;

use super::{confirm, open_store};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::utils::content_id;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Content id of the record to remove
    #[arg(conflicts_with_all = ["url", "all"])]
    pub content_id: Option<String>,

    /// Remove the record indexed from this URL
    #[arg(long, conflicts_with = "all")]
    pub url: Option<String>,

    /// Remove every vector in the namespace
    #[arg(long)]
    pub all: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// What a delete invocation targets.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Content(String),
    Namespace,
}

fn resolve_target(args: &DeleteArgs) -> Result<Target> {
    if args.all {
        return Ok(Target::Namespace);
    }
    if let Some(ref id) = args.content_id {
        return Ok(Target::Content(id.trim().to_string()));
    }
    if let Some(ref url) = args.url {
        return Ok(Target::Content(content_id(url.trim())));
    }
    anyhow::bail!("specify a content id, --url or --all")
}

pub async fn handle_delete(args: DeleteArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let target = resolve_target(&args)?;
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let prompt = match target {
        Target::Content(ref id) => format!(
            "This will delete all vectors of content '{}' from namespace '{}'. Continue?",
            id, config.vector_store.namespace
        ),
        Target::Namespace => format!(
            "This will delete ALL vectors in namespace '{}'. Continue?",
            config.vector_store.namespace
        ),
    };
    if !args.yes && !confirm(&prompt)? {
        print!("{}", formatter.format_message("Cancelled."));
        return Ok(());
    }

    let store = open_store(&config).await?;

    match target {
        Target::Content(id) => {
            if verbose {
                eprintln!("Deleting content id {id}");
            }
            store
                .delete_document(&id)
                .await
                .context("failed to delete content")?;
            print!(
                "{}",
                formatter.format_message(&format!("Deleted content {id} from index"))
            );
        }
        Target::Namespace => {
            store.clear().await.context("failed to clear namespace")?;
            print!(
                "{}",
                formatter.format_message(&format!(
                    "Cleared namespace '{}'",
                    config.vector_store.namespace
                ))
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(content_id: Option<&str>, url: Option<&str>, all: bool) -> DeleteArgs {
        DeleteArgs {
            content_id: content_id.map(str::to_string),
            url: url.map(str::to_string),
            all,
            yes: true,
        }
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target(&args(Some("0123456789abcdef"), None, false)).unwrap(),
            Target::Content("0123456789abcdef".to_string())
        );
        assert_eq!(
            resolve_target(&args(None, Some("https://shop.test/p/1"), false)).unwrap(),
            Target::Content(content_id("https://shop.test/p/1"))
        );
        assert_eq!(
            resolve_target(&args(None, None, true)).unwrap(),
            Target::Namespace
        );
        assert!(resolve_target(&args(None, None, false)).is_err());
    }
}
