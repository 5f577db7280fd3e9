//! # Documents
//!
//! Reads `.txt`, `.pdf` and `.docx` files as plain text and splits the text into
//! overlapping word windows ready for indexing.

pub mod chunker;
pub mod error;
pub mod extract;
pub mod info;
pub mod processor;

pub use chunker::split_text;
pub use error::{DocumentError, Result};
pub use extract::{SUPPORTED_EXTENSIONS, extract_text, is_supported};
pub use info::{DocumentInfo, document_info, list_documents};
pub use processor::{DocumentConfig, DocumentProcessor};
