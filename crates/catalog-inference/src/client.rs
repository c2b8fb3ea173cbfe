//! Single-text embedding client with the "no embedding" sentinel.
//!
//! [`EmbeddingClient`] wraps any [`EmbeddingBackend`] and enforces the vector
//! invariant the pipeline relies on: a returned vector either has exactly the
//! backend's dimension or is empty. It never retries.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use catalog_core::{empty_vector, is_absent, EmbeddingBackend, Error, Result, Vector};

/// Embeds one text at a time through a shared backend.
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingClient {
    /// Create a client over the given backend.
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Expected vector dimension.
    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Model used by the backend.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Embed `text`, reporting why no vector was produced.
    ///
    /// `Ok` holds either a vector of the expected dimension or the empty
    /// sentinel (the service answered with no embedding). Transport errors,
    /// non-2xx answers, malformed payloads and dimension mismatches are all
    /// [`Error::Embedding`].
    pub async fn try_embed(&self, text: &str) -> Result<Vector> {
        let start = Instant::now();
        let mut vectors = self.backend.embed_texts(&[text.to_string()]).await?;

        if vectors.len() > 1 {
            return Err(Error::Embedding(format!(
                "expected 1 vector for 1 input, got {}",
                vectors.len()
            )));
        }
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("service returned no vectors".to_string()))?;

        if is_absent(&vector) {
            return Ok(vector);
        }

        let expected = self.backend.dimension();
        let actual = vector.as_slice().len();
        if actual != expected {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, got {}",
                expected, actual
            )));
        }

        debug!(
            subsystem = "inference",
            op = "embed",
            model = self.backend.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding generated"
        );
        Ok(vector)
    }

    /// Embed `text`, collapsing every failure into the empty sentinel.
    pub async fn embed(&self, text: &str) -> Vector {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    op = "embed",
                    error = %e,
                    "Error generating embedding"
                );
                empty_vector()
            }
        }
    }
}
