//! OpenAI-specific error handling.

use catalog_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an OpenAI error response into a catalog embedding error.
///
/// Every variant maps to [`Error::Embedding`]: whatever went wrong, the
/// affected company is skipped rather than the run stopped.
pub fn to_catalog_error(code: OpenAIErrorCode, status: u16, message: &str) -> Error {
    let kind = match code {
        OpenAIErrorCode::AuthenticationError => "authentication failed",
        OpenAIErrorCode::RateLimitExceeded => "rate limit exceeded",
        OpenAIErrorCode::ModelNotFound => "model not found",
        OpenAIErrorCode::ContextLengthExceeded => "input too long",
        OpenAIErrorCode::ServerError => "server error",
        OpenAIErrorCode::Unknown => "request rejected",
    };
    Error::Embedding(format!("OpenAI returned {} ({}): {}", status, kind, message))
}
