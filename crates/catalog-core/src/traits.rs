//! Core traits for catalog-ingest abstractions.
//!
//! These traits define the seams between the pipeline coordinator and its
//! I/O collaborators, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CatalogPage, Company, Vector};

// =============================================================================
// CATALOG SOURCE
// =============================================================================

/// Paginated, read-only source of catalog entities.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the page addressed by `locator`.
    ///
    /// Errors are fatal for the run: a broken pagination source invalidates
    /// the whole traversal.
    async fn fetch_page(&self, locator: &str) -> Result<CatalogPage>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// STORAGE TRAITS
// =============================================================================

/// Destination for enriched companies.
///
/// Implementations are shared by every concurrent enrichment task and must
/// tolerate concurrent calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one company together with its embedding.
    ///
    /// Every call is an insert; there is no upsert.
    async fn store(&self, company: &Company, embedding: &Vector) -> Result<()>;
}
