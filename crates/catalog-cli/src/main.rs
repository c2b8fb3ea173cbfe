//! catalog-ingest: walk the company catalog, embed each description and
//! store the result in PostgreSQL.

mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use catalog_db::{log_pool_metrics, Database, PoolConfig};
use catalog_inference::{EmbeddingBackend, EmbeddingClient, OpenAIBackend, OpenAIConfig};
use catalog_pipeline::{Enricher, HttpCatalogSource, PageWalker, WalkSummary};

use config::{Cli, IngestSettings};
use logging::LogSettings;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_settings = LogSettings::from_env();
    let _file_guard = logging::init(&log_settings);
    info!(
        json = log_settings.json,
        log_file = log_settings.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(settings).await {
        Ok(summary) => {
            info!(
                pages = summary.pages,
                stored = summary.enrich.stored,
                skipped = summary.enrich.skipped(),
                duration_ms = summary.duration.as_millis() as u64,
                "Ingest complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Ingest failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: IngestSettings) -> anyhow::Result<WalkSummary> {
    let openai = OpenAIConfig::from_env().with_api_key(settings.openai_api_key);
    let backend = Arc::new(OpenAIBackend::new(openai).context("Failed to configure embedding backend")?);
    let dimension = backend.dimension();

    info!("Connecting to database...");
    let pool_config = PoolConfig::for_concurrency(settings.pipeline.concurrency);
    let db = Database::connect_with_config(&settings.database_url, dimension, pool_config)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    if let Err(e) = db.bootstrap(settings.reset).await {
        db.close().await;
        return Err(anyhow::Error::new(e).context("Failed to prepare companies table"));
    }

    let source = Arc::new(HttpCatalogSource::from_env().context("Failed to configure catalog source")?);
    let enricher = Enricher::new(EmbeddingClient::new(backend), Arc::new(db.companies.clone()))
        .with_storage_failure_policy(settings.pipeline.storage_failure_policy);
    let walker = PageWalker::new(source, Arc::new(enricher), settings.pipeline)?;

    let result = walker.run().await;

    log_pool_metrics(db.pool());
    db.close().await;

    Ok(result?)
}
