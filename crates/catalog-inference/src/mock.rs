//! Mock embedding backend for deterministic testing.
//!
//! Generates deterministic embeddings so pipeline tests can run without a
//! network. Latency, failure rate and per-text failures are configurable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_inference::mock::MockEmbeddingBackend;
//! use catalog_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockEmbeddingBackend::new().with_dimension(8);
//!     let vectors = backend.embed_texts(&["test text".to_string()]).await.unwrap();
//!     assert_eq!(vectors[0].as_slice().len(), 8);
//! }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use catalog_core::{defaults, empty_vector, EmbeddingBackend, Error, Result, Vector};

/// Mock embedding backend for testing.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    latency_ms: u64,
    failure_rate: f64,
    failing_texts: HashSet<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::EMBED_DIMENSION,
            latency_ms: 0,
            failure_rate: 0.0,
            failing_texts: HashSet::new(),
        }
    }
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set simulated latency for every request.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Always fail requests for this exact input text.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_texts
            .insert(text.into());
        self
    }

    /// Texts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of texts received so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    fn should_fail(&self, text: &str) -> bool {
        use rand::Rng;
        if self.config.failing_texts.contains(text) {
            return true;
        }
        self.config.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.config.failure_rate
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.call_log.lock().unwrap().extend(texts.iter().cloned());

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            if self.should_fail(text) {
                return Err(Error::Embedding(format!(
                    "simulated failure for input of {} bytes",
                    text.len()
                )));
            }
            // Like the real service, blank input yields nothing to store.
            if text.trim().is_empty() {
                vectors.push(empty_vector());
            } else {
                vectors.push(Vector::from(MockEmbeddingGenerator::generate(
                    text,
                    self.config.dimension,
                )));
            }
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic embedding from text.
    ///
    /// Uses character-based hashing for reproducibility. The same text
    /// will always produce the same embedding.
    pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension];
        if dimension == 0 {
            return vec;
        }

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }

        Self::normalize(&mut vec);
        vec
    }

    fn normalize(vec: &mut [f32]) {
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in vec.iter_mut() {
                *x /= magnitude;
            }
        }
    }
}
