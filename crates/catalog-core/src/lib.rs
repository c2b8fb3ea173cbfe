//! # catalog-core
//!
//! Core types, traits, and abstractions for catalog-ingest.
//!
//! This crate provides the catalog data model, the shared error type and the
//! trait seams (catalog source, embedding backend, record store) that the
//! other catalog-ingest crates implement or consume.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Fatal condition, the run stops |
//! | WARN  | One entity lost (embedding failure, tolerated storage failure) |
//! | INFO  | Lifecycle events, page progress, stored records |
//! | DEBUG | Per-entity decisions, request details |
//!
//! Structured fields use the names `subsystem`, `component`, `op`, `company`,
//! `page`, `locator`, `duration_ms` and `error` across all crates.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
