//! Error types for document processing.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors raised while reading a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The path does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The extension is not one we can extract.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The archive is unreadable or lacks the expected part.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The PDF could not be parsed.
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
