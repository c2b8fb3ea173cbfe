//! Per-company unit of work: embed the description, then store.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use catalog_core::{is_absent, Company, Error, RecordStore, Result};
use catalog_inference::EmbeddingClient;

/// What to do when the destination rejects a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageFailurePolicy {
    /// Fail the run.
    #[default]
    Abort,
    /// Log, count and move on to the next company.
    Skip,
}

/// Why a company was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The catalog sent no description; the embedding service was not called.
    EmptyText,
    /// The embedding call failed or returned an unusable vector.
    EmbeddingFailed,
    /// The embedding service answered without a vector.
    EmptyEmbedding,
    /// The store rejected the row under [`StorageFailurePolicy::Skip`].
    StorageFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::EmptyText => "empty_text",
            SkipReason::EmbeddingFailed => "embedding_failed",
            SkipReason::EmptyEmbedding => "empty_embedding",
            SkipReason::StorageFailed => "storage_failed",
        };
        f.write_str(s)
    }
}

/// Result of enriching one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    Stored,
    Skipped(SkipReason),
}

/// Snapshot of enrichment counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub stored: usize,
    pub empty_text: usize,
    pub embedding_failed: usize,
    pub empty_embedding: usize,
    pub storage_failed: usize,
}

impl EnrichStats {
    /// Companies that were not stored, for any reason.
    pub fn skipped(&self) -> usize {
        self.empty_text + self.embedding_failed + self.empty_embedding + self.storage_failed
    }
}

#[derive(Default)]
struct Counters {
    stored: AtomicUsize,
    empty_text: AtomicUsize,
    embedding_failed: AtomicUsize,
    empty_embedding: AtomicUsize,
    storage_failed: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: EnrichOutcome) {
        let counter = match outcome {
            EnrichOutcome::Stored => &self.stored,
            EnrichOutcome::Skipped(SkipReason::EmptyText) => &self.empty_text,
            EnrichOutcome::Skipped(SkipReason::EmbeddingFailed) => &self.embedding_failed,
            EnrichOutcome::Skipped(SkipReason::EmptyEmbedding) => &self.empty_embedding,
            EnrichOutcome::Skipped(SkipReason::StorageFailed) => &self.storage_failed,
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }
}

/// Composes the embedding client and the record store.
///
/// Embedding problems are absorbed as skips. Storage problems follow the
/// configured [`StorageFailurePolicy`]. Shared by every concurrent task.
pub struct Enricher {
    embeddings: EmbeddingClient,
    store: Arc<dyn RecordStore>,
    policy: StorageFailurePolicy,
    counters: Counters,
}

impl Enricher {
    pub fn new(embeddings: EmbeddingClient, store: Arc<dyn RecordStore>) -> Self {
        Self {
            embeddings,
            store,
            policy: StorageFailurePolicy::default(),
            counters: Counters::default(),
        }
    }

    /// Set the storage failure policy.
    pub fn with_storage_failure_policy(mut self, policy: StorageFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn storage_failure_policy(&self) -> StorageFailurePolicy {
        self.policy
    }

    /// Enrich and store one company.
    ///
    /// Returns `Err` only for a storage failure under
    /// [`StorageFailurePolicy::Abort`]; every other problem is a skip.
    pub async fn enrich(&self, company: &Company) -> Result<EnrichOutcome> {
        let outcome = self.process(company).await?;
        self.counters.record(outcome);
        Ok(outcome)
    }

    async fn process(&self, company: &Company) -> Result<EnrichOutcome> {
        let start = Instant::now();
        let name = company.display_name();
        let text = company.embedding_text();

        if text.trim().is_empty() {
            debug!(
                subsystem = "pipeline",
                component = "enricher",
                company = %name,
                "Skipping company without description"
            );
            return Ok(EnrichOutcome::Skipped(SkipReason::EmptyText));
        }

        debug!(
            subsystem = "pipeline",
            component = "enricher",
            company = %name,
            "Generating embedding for company"
        );
        let embedding = match self.embeddings.try_embed(text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    subsystem = "pipeline",
                    component = "enricher",
                    company = %name,
                    error = %e,
                    "Error generating embedding"
                );
                return Ok(EnrichOutcome::Skipped(SkipReason::EmbeddingFailed));
            }
        };

        if is_absent(&embedding) {
            warn!(
                subsystem = "pipeline",
                component = "enricher",
                company = %name,
                "Skipping company due to missing embedding"
            );
            return Ok(EnrichOutcome::Skipped(SkipReason::EmptyEmbedding));
        }

        if let Err(e) = self.store.store(company, &embedding).await {
            return match self.policy {
                StorageFailurePolicy::Abort => {
                    self.counters.storage_failed.fetch_add(1, Ordering::AcqRel);
                    error!(
                        subsystem = "pipeline",
                        component = "enricher",
                        company = %name,
                        error = %e,
                        "Error storing company"
                    );
                    Err(Error::Storage(format!(
                        "failed to store company '{}': {}",
                        name, e
                    )))
                }
                StorageFailurePolicy::Skip => {
                    warn!(
                        subsystem = "pipeline",
                        component = "enricher",
                        company = %name,
                        error = %e,
                        "Error storing company, continuing"
                    );
                    Ok(EnrichOutcome::Skipped(SkipReason::StorageFailed))
                }
            };
        }

        info!(
            subsystem = "pipeline",
            component = "enricher",
            company = %name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Company stored successfully"
        );
        Ok(EnrichOutcome::Stored)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> EnrichStats {
        let c = &self.counters;
        EnrichStats {
            stored: c.stored.load(Ordering::Acquire),
            empty_text: c.empty_text.load(Ordering::Acquire),
            embedding_failed: c.embedding_failed.load(Ordering::Acquire),
            empty_embedding: c.empty_embedding.load(Ordering::Acquire),
            storage_failed: c.storage_failed.load(Ordering::Acquire),
        }
    }
}
