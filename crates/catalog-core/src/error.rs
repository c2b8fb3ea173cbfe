//! Error types for catalog-ingest.

use thiserror::Error;

/// Result type alias using catalog-ingest's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for catalog-ingest operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Catalog page could not be fetched or decoded
    #[error("Page fetch error: {0}")]
    PageFetch(String),

    /// Persisting an enriched record failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error ends the whole run rather than a single entity.
    ///
    /// Embedding failures only cost one record; everything touching the
    /// pagination cursor, the destination store or startup is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Embedding(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
