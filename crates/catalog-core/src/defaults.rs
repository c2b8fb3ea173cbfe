//! Centralized default constants for catalog-ingest.
//!
//! Every crate and the CLI reference these values instead of defining their
//! own magic numbers.

// =============================================================================
// CATALOG SOURCE
// =============================================================================

/// First page of the company catalog.
pub const CATALOG_START_URL: &str = "https://api.ycombinator.com/v0.1/companies?page=1";

/// Timeout for a single catalog page request, in seconds.
pub const CATALOG_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const EMBED_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-ada-002";

/// Embedding vector dimension for text-embedding-ada-002.
pub const EMBED_DIMENSION: usize = 1536;

/// Timeout for a single embedding request, in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// PIPELINE
// =============================================================================

/// Maximum number of enrichment tasks in flight at once.
pub const INGEST_CONCURRENCY: usize = 3;

// =============================================================================
// DATABASE
// =============================================================================

/// Destination table for enriched companies.
pub const COMPANIES_TABLE: &str = "companies";

/// Maximum pool connections. Kept a little above the default concurrency so
/// bootstrap and counting queries never wait behind enrichment inserts.
pub const DB_MAX_CONNECTIONS: u32 = 5;
