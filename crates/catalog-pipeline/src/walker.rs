//! Page walker: the run coordinator.
//!
//! Walks the catalog one page at a time. Every company on a page becomes an
//! enrichment task on a [`BoundedScheduler`]; the walker drains the scheduler
//! before it asks for the next page, so companies from two pages are never
//! in flight together.
//!
//! ```text
//! Fetching(locator) ──fetch ok──▶ Draining { next } ──drained──▶ Fetching(next)
//!        │                              │                    └─▶ Done
//!        └──fetch error──▶ Err          └──storage failure latched──▶ Err
//! ```

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use catalog_core::{defaults, CatalogSource, Error, Result};

use crate::enricher::{EnrichStats, Enricher, StorageFailurePolicy};
use crate::scheduler::{BoundedScheduler, SchedulerStats};

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Locator of the first page.
    pub start_url: String,
    /// Maximum enrichment tasks in flight.
    pub concurrency: usize,
    /// Stop after this many pages even if the catalog has more.
    pub max_pages: Option<u32>,
    /// What the enricher does when a write fails.
    pub storage_failure_policy: StorageFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_url: defaults::CATALOG_START_URL.to_string(),
            concurrency: defaults::INGEST_CONCURRENCY,
            max_pages: None,
            storage_failure_policy: StorageFailurePolicy::Abort,
        }
    }
}

impl PipelineConfig {
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = url.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_storage_failure_policy(mut self, policy: StorageFailurePolicy) -> Self {
        self.storage_failure_policy = policy;
        self
    }
}

/// Outcome of a completed walk.
#[derive(Debug, Clone)]
pub struct WalkSummary {
    /// Pages fetched.
    pub pages: u32,
    /// Companies seen across all pages.
    pub companies: usize,
    /// Enricher counters at the end of the run.
    pub enrich: EnrichStats,
    /// Scheduler counters for this run.
    pub scheduler: SchedulerStats,
    pub duration: Duration,
}

enum WalkState {
    Fetching(String),
    Draining { next: Option<String> },
    Done,
}

/// Coordinates page fetching and bounded per-company enrichment.
pub struct PageWalker {
    source: Arc<dyn CatalogSource>,
    enricher: Arc<Enricher>,
    config: PipelineConfig,
}

impl PageWalker {
    /// Create a walker. Fails when the concurrency limit is zero.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        enricher: Arc<Enricher>,
        config: PipelineConfig,
    ) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(Error::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            source,
            enricher,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Walk every page from the start locator until the catalog runs out.
    ///
    /// Fails on the first page-fetch error, and on the first fatal storage
    /// failure. A storage failure halts the scheduler: the rest of the page
    /// is cancelled, running siblings are dropped before they write, and no
    /// further page is requested.
    pub async fn run(&self) -> Result<WalkSummary> {
        let start = Instant::now();
        let scheduler = BoundedScheduler::new(self.config.concurrency)?;
        let fatal: Arc<OnceLock<String>> = Arc::new(OnceLock::new());

        let mut pages = 0u32;
        let mut companies = 0usize;
        let mut state = WalkState::Fetching(self.config.start_url.clone());

        info!(
            subsystem = "pipeline",
            component = "walker",
            locator = %self.config.start_url,
            concurrency = self.config.concurrency,
            "Starting catalog ingest"
        );

        loop {
            state = match state {
                WalkState::Fetching(locator) => {
                    let page = match self.source.fetch_page(&locator).await {
                        Ok(page) => page,
                        Err(e) => {
                            error!(
                                subsystem = "pipeline",
                                component = "walker",
                                locator = %locator,
                                error = %e,
                                "Error scraping companies"
                            );
                            return Err(e);
                        }
                    };
                    pages += 1;
                    companies += page.companies.len();

                    info!(
                        subsystem = "pipeline",
                        component = "walker",
                        page = page.page.unwrap_or(pages),
                        companies = page.companies.len(),
                        "Scraping page {} of {}",
                        page.page.unwrap_or(pages),
                        page.total_pages
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "?".to_string())
                    );

                    let mut next = if page.has_next() { page.next_page } else { None };
                    if self.config.max_pages.is_some_and(|max| pages >= max) && next.is_some() {
                        info!(
                            subsystem = "pipeline",
                            component = "walker",
                            pages,
                            "Page limit reached, stopping after this page"
                        );
                        next = None;
                    }

                    for company in page.companies {
                        let enricher = self.enricher.clone();
                        let halt = scheduler.halt_handle();
                        let fatal = fatal.clone();
                        let label = company.display_name();
                        scheduler.submit(label, async move {
                            match enricher.enrich(&company).await {
                                Ok(_) => Ok(()),
                                Err(e) if e.is_fatal() => {
                                    let reason = match &e {
                                        Error::Storage(msg) => msg.clone(),
                                        other => other.to_string(),
                                    };
                                    let _ = fatal.set(reason);
                                    halt.halt();
                                    Err(e)
                                }
                                Err(e) => Err(e),
                            }
                        });
                    }

                    WalkState::Draining { next }
                }
                WalkState::Draining { next } => {
                    scheduler.drain().await;

                    if let Some(reason) = fatal.get() {
                        let stats = scheduler.stats();
                        error!(
                            subsystem = "pipeline",
                            component = "walker",
                            pages,
                            cancelled = stats.cancelled,
                            error = %reason,
                            "Ingest aborted after storage failure"
                        );
                        return Err(Error::Storage(reason.clone()));
                    }

                    match next {
                        Some(locator) => {
                            debug!(
                                subsystem = "pipeline",
                                component = "walker",
                                locator = %locator,
                                "Fetching next page"
                            );
                            WalkState::Fetching(locator)
                        }
                        None => WalkState::Done,
                    }
                }
                WalkState::Done => break,
            };
        }

        let summary = WalkSummary {
            pages,
            companies,
            enrich: self.enricher.stats(),
            scheduler: scheduler.stats(),
            duration: start.elapsed(),
        };

        if summary.scheduler.failed > 0 {
            warn!(
                subsystem = "pipeline",
                component = "walker",
                failed = summary.scheduler.failed,
                "Some enrichment tasks failed"
            );
        }
        info!(
            subsystem = "pipeline",
            component = "walker",
            pages = summary.pages,
            companies = summary.companies,
            stored = summary.enrich.stored,
            skipped = summary.enrich.skipped(),
            duration_ms = summary.duration.as_millis() as u64,
            "All companies scraped successfully"
        );
        Ok(summary)
    }
}
