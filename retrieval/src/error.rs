//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding index error.
    #[error("embedding error: {0}")]
    Embedding(#[from] ragbot_embeddings::EmbeddingError),

    /// Document extraction error.
    #[error("document error: {0}")]
    Document(#[from] ragbot_documents::DocumentError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed configuration file.
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
