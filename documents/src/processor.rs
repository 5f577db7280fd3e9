use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunker::split_text;
use crate::error::Result;
use crate::extract::extract_text;

/// Chunking settings, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Words per chunk.
    pub chunk_size: usize,

    /// Words shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Extracts and chunks documents with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    config: DocumentConfig,
}

impl DocumentProcessor {
    pub fn new(config: DocumentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> DocumentConfig {
        self.config
    }

    /// Chunk already extracted text.
    pub fn split(&self, text: &str) -> Vec<String> {
        split_text(text, self.config.chunk_size, self.config.chunk_overlap)
    }

    /// Extract `path` and chunk its text.
    pub fn process(&self, path: &Path) -> Result<Vec<String>> {
        let text = extract_text(path)?;
        let chunks = self.split(&text);
        debug!("{} produced {} chunks", path.display(), chunks.len());
        Ok(chunks)
    }
}
