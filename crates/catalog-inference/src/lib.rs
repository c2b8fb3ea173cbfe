//! # catalog-inference
//!
//! Embedding backend abstraction for catalog-ingest.
//!
//! This crate provides:
//! - OpenAI-compatible embedding backend
//! - [`EmbeddingClient`], the single-text wrapper that enforces the vector
//!   dimension invariant and the empty "no embedding" sentinel
//! - Mock backend for deterministic tests (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Enable [`mock::MockEmbeddingBackend`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use catalog_inference::{EmbeddingClient, OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::new(OpenAIConfig::from_env()).unwrap();
//!     let client = EmbeddingClient::new(Arc::new(backend));
//!     let vector = client.embed("We build rockets.").await;
//! }
//! ```

pub mod client;
pub mod openai;

// Mock embedding backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use catalog_core::*;

pub use client::EmbeddingClient;
pub use openai::{OpenAIBackend, OpenAIConfig};
