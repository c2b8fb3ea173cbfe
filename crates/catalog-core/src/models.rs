//! Core data models for catalog-ingest.
//!
//! These types are shared across all catalog-ingest crates and mirror the
//! JSON payloads of the remote company catalog.

use serde::{Deserialize, Serialize};

// =============================================================================
// CATALOG TYPES
// =============================================================================

/// One company record from the remote catalog.
///
/// The pipeline treats this as an opaque payload: only `long_description`
/// (embedding input) and `name` (log identification) are ever read before the
/// record reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Identifier assigned by the catalog.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub small_logo_url: Option<String>,
    #[serde(default)]
    pub one_liner: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub team_size: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub badges: Vec<String>,
}

impl Company {
    /// Text used as embedding input. Empty when the catalog sent none.
    pub fn embedding_text(&self) -> &str {
        self.long_description.as_deref().unwrap_or("")
    }

    /// Name used in log lines; falls back to the slug, then the catalog id.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match (&self.slug, self.id) {
            (Some(slug), _) if !slug.is_empty() => slug.clone(),
            (_, Some(id)) => format!("#{}", id),
            _ => "<unnamed>".to_string(),
        }
    }
}

/// One page of the remote catalog plus its pagination metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    #[serde(default)]
    pub companies: Vec<Company>,
    /// Page number as reported by the catalog.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Locator of the following page; `None` ends the traversal.
    #[serde(default)]
    pub next_page: Option<String>,
}

impl CatalogPage {
    /// Whether the catalog reported another page after this one.
    pub fn has_next(&self) -> bool {
        self.next_page.as_deref().is_some_and(|s| !s.is_empty())
    }
}

// =============================================================================
// EMBEDDING TYPES
// =============================================================================

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

/// The "no embedding available" sentinel.
pub fn empty_vector() -> Vector {
    Vector::from(Vec::<f32>::new())
}

/// True when `vector` is the empty sentinel.
pub fn is_absent(vector: &Vector) -> bool {
    vector.as_slice().is_empty()
}
