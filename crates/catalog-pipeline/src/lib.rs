//! # catalog-pipeline
//!
//! Paginated catalog ingest for catalog-ingest.
//!
//! This crate provides:
//! - [`HttpCatalogSource`], the HTTP page fetcher
//! - [`BoundedScheduler`], a fire-and-forget task runner with a concurrency
//!   ceiling and a drain barrier
//! - [`Enricher`], the per-company embed-then-store unit of work
//! - [`PageWalker`], which ties them together page by page
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use catalog_db::Database;
//! use catalog_inference::{EmbeddingClient, OpenAIBackend};
//! use catalog_pipeline::{Enricher, HttpCatalogSource, PageWalker, PipelineConfig};
//!
//! let db = Database::connect("postgres://...", 1536).await?;
//! db.bootstrap(true).await?;
//!
//! let embeddings = EmbeddingClient::new(Arc::new(OpenAIBackend::from_env()?));
//! let enricher = Arc::new(Enricher::new(embeddings, Arc::new(db.companies.clone())));
//! let source = Arc::new(HttpCatalogSource::from_env()?);
//!
//! let walker = PageWalker::new(
//!     source,
//!     enricher,
//!     PipelineConfig::default().with_concurrency(5).with_max_pages(Some(10)),
//! )?;
//! let summary = walker.run().await?;
//! println!("stored {} companies", summary.enrich.stored);
//! ```

pub mod catalog;
pub mod enricher;
pub mod scheduler;
pub mod walker;

// Re-export core types
pub use catalog_core::*;

pub use catalog::{CatalogSourceConfig, HttpCatalogSource};
pub use enricher::{EnrichOutcome, EnrichStats, Enricher, SkipReason, StorageFailurePolicy};
pub use scheduler::{BoundedScheduler, HaltHandle, SchedulerStats};
pub use walker::{PageWalker, PipelineConfig, WalkSummary};
