//! Command-line and environment configuration for `catalog-ingest`.

use clap::builder::BoolishValueParser;
use clap::Parser;

use catalog_core::{defaults, Error, Result};
use catalog_pipeline::{PipelineConfig, StorageFailurePolicy};

#[derive(Parser, Debug, Clone)]
#[command(name = "catalog-ingest")]
#[command(author, version, about = "Ingest the company catalog into PostgreSQL with embeddings")]
pub struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// API key for the embedding service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Locator of the first catalog page
    #[arg(long, env = "CATALOG_START_URL", default_value = defaults::CATALOG_START_URL)]
    pub start_url: String,

    /// Maximum companies enriched at the same time
    #[arg(short, long, env = "INGEST_CONCURRENCY", default_value_t = defaults::INGEST_CONCURRENCY)]
    pub concurrency: usize,

    /// Stop after this many pages
    #[arg(long, env = "INGEST_MAX_PAGES")]
    pub max_pages: Option<u32>,

    /// Keep rows from earlier runs instead of truncating the table
    /// (companies are inserted again, so duplicates accumulate)
    #[arg(long)]
    pub no_reset: bool,

    /// Log and skip companies the database rejects instead of aborting
    #[arg(
        long,
        env = "INGEST_TOLERATE_STORAGE_FAILURES",
        value_parser = BoolishValueParser::new()
    )]
    pub tolerate_storage_failures: bool,
}

/// Validated settings for one ingest run.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub database_url: String,
    pub openai_api_key: String,
    pub reset: bool,
    pub pipeline: PipelineConfig,
}

impl Cli {
    /// Check required values before anything touches the network.
    pub fn settings(self) -> Result<IngestSettings> {
        let database_url = required(self.database_url, "DATABASE_URL")?;
        let openai_api_key = required(self.openai_api_key, "OPENAI_API_KEY")?;

        if self.concurrency == 0 {
            return Err(Error::Config(
                "INGEST_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(Error::Config(
                "INGEST_MAX_PAGES must be at least 1".to_string(),
            ));
        }

        let policy = if self.tolerate_storage_failures {
            StorageFailurePolicy::Skip
        } else {
            StorageFailurePolicy::Abort
        };

        Ok(IngestSettings {
            database_url,
            openai_api_key,
            reset: !self.no_reset,
            pipeline: PipelineConfig::default()
                .with_start_url(self.start_url)
                .with_concurrency(self.concurrency)
                .with_max_pages(self.max_pages)
                .with_storage_failure_policy(policy),
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} is not set", name)))
}
