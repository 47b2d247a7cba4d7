//! CLI runner - executes commands

use crate::cli::commands::{Cli, CollectArgs, Commands, OutputFormat};
use crate::collector::{Collection, PaginatedCollector};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::fetcher::{HttpPageFetcher, PageFetcher};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Collect(args) => self.collect(args).await,
            Commands::Probe { page_size } => self.probe(*page_size).await,
        }
    }

    /// Load settings and apply `collect` overrides
    fn settings(&self, args: &CollectArgs) -> Result<Settings> {
        let mut settings = Settings::load(self.cli.config.as_deref())?;
        apply_overrides(&mut settings, args);
        settings.validate()?;
        Ok(settings)
    }

    fn collector(settings: &Settings) -> Result<PaginatedCollector> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::from_settings(settings)?);
        Ok(PaginatedCollector::new(fetcher, settings.collector_config()))
    }

    async fn collect(&self, args: &CollectArgs) -> Result<()> {
        let settings = self.settings(args)?;
        info!(
            "Collecting library {} with {} workers",
            settings.library_id, settings.workers
        );

        let collector = Self::collector(&settings)?;
        let cancel = collector.cancellation_token();
        let signal = tokio::spawn(cancel_on_ctrl_c(cancel));

        let result = collector.collect().await;
        signal.abort();
        let collection = result?;

        print_collection(&collection, args.format)?;

        if collection.is_complete() {
            Ok(())
        } else {
            Err(Error::Incomplete {
                failed: collection.failures.len(),
                pages: collection.plan.pages,
            })
        }
    }

    async fn probe(&self, page_size: Option<u32>) -> Result<()> {
        let args = CollectArgs {
            page_size,
            ..CollectArgs::default()
        };
        let settings = self.settings(&args)?;
        let plan = Self::collector(&settings)?.probe().await?;

        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "total_items": plan.total_items,
                "page_size": plan.page_size,
                "pages": plan.pages,
            }))?
        );
        Ok(())
    }
}

fn apply_overrides(settings: &mut Settings, args: &CollectArgs) {
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size;
    }
    if let Some(probe_page_size) = args.probe_page_size {
        settings.probe_page_size = probe_page_size;
    }
    if let Some(status) = args.excluded_status {
        settings.excluded_status = status;
    }
    if args.fail_fast {
        settings.fail_fast = true;
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling collection");
        cancel.cancel();
    }
}

fn print_collection(collection: &Collection, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&collection_json(collection))?);
        }
        OutputFormat::Pretty => {
            for id in collection.results.iter() {
                println!("{id}");
            }
            eprintln!(
                "{} ids from {}/{} pages ({} items) in {}ms",
                collection.results.len(),
                collection.stats.pages_fetched,
                collection.plan.pages,
                collection.plan.total_items,
                collection.stats.duration_ms
            );
            for failure in &collection.failures {
                eprintln!("  page {} failed: {}", failure.page, failure.error);
            }
        }
    }
    Ok(())
}

fn collection_json(collection: &Collection) -> serde_json::Value {
    let failures: Vec<_> = collection
        .failures
        .iter()
        .map(|f| json!({ "page": f.page, "error": f.error.to_string() }))
        .collect();

    json!({
        "total_items": collection.plan.total_items,
        "pages": collection.plan.pages,
        "count": collection.results.len(),
        "ids": collection.results,
        "failed_pages": failures,
        "stats": {
            "pages_fetched": collection.stats.pages_fetched,
            "pages_failed": collection.stats.pages_failed,
            "items_seen": collection.stats.items_seen,
            "duplicates": collection.stats.duplicates,
            "duration_ms": collection.stats.duration_ms,
        },
    })
}
