//! OpenAI-compatible embedding backend.
//!
//! Works with any endpoint exposing the OpenAI `/embeddings` API:
//!
//! - OpenAI cloud API
//! - Azure OpenAI
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM, LocalAI, LM Studio
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use catalog_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig::from_env().with_api_key("sk-...");
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let texts = vec!["We build rockets.".to_string()];
//!     let vectors = backend.embed_texts(&texts).await.unwrap();
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{
    OpenAIBackend, OpenAIConfig, DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL, DEFAULT_OPENAI_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{to_catalog_error, OpenAIErrorCode};
pub use types::*;
