//! Error types for answer generation.

use thiserror::Error;

/// Result type alias for generation backend calls.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised by a generation backend.
///
/// The pipeline never surfaces these; each one moves the fallback chain on
/// to its next stage.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Provider not configured.
    #[error("generation provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The backend answered without any generated text.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Malformed input to the answer pipeline itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    /// The question is empty or only whitespace.
    #[error("question is empty")]
    EmptyQuestion,
}
