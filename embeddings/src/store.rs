//! Fragment storage backing the embedding index.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Provenance metadata attached to a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    /// Where the fragment came from (usually a file path).
    pub source: Option<String>,

    /// Position of the fragment within its source.
    pub chunk_index: Option<usize>,

    /// Free-form extension fields.
    pub extra: BTreeMap<String, String>,
}

impl FragmentMetadata {
    /// Metadata carrying only a source identifier.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// Set the chunk index.
    pub fn with_chunk_index(mut self, index: usize) -> Self {
        self.chunk_index = Some(index);
        self
    }

    /// Add an extension field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// File name component of the source, if any.
    pub fn source_name(&self) -> Option<String> {
        let source = self.source.as_deref()?;
        Path::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// A unit of retrievable text. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    text: String,
    metadata: FragmentMetadata,
}

impl Fragment {
    /// Create a new fragment.
    pub fn new(text: impl Into<String>, metadata: FragmentMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// The fragment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The fragment metadata.
    pub fn metadata(&self) -> &FragmentMetadata {
        &self.metadata
    }
}

/// A fragment paired with its relevance score for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    /// Shared reference into the fragment store.
    pub fragment: Arc<Fragment>,

    /// Similarity score, higher is more relevant.
    pub score: f32,
}

impl ScoredFragment {
    /// Pair a fragment with a score.
    pub fn new(fragment: Arc<Fragment>, score: f32) -> Self {
        Self { fragment, score }
    }
}

/// Ordered sequence of fragments. Position `i` matches vector `i` in the index.
#[derive(Debug, Default)]
pub struct FragmentStore {
    fragments: Vec<Arc<Fragment>>,
}

impl FragmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append fragments in order.
    pub fn extend(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        self.fragments.extend(fragments.into_iter().map(Arc::new));
    }

    /// Get the fragment at a position.
    pub fn get(&self, position: usize) -> Option<&Arc<Fragment>> {
        self.fragments.get(position)
    }

    /// Number of stored fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Iterate over fragments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Fragment>> {
        self.fragments.iter()
    }

    /// Remove every fragment.
    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Distinct source file names, sorted.
    pub fn source_names(&self) -> Vec<String> {
        self.fragments
            .iter()
            .filter_map(|f| f.metadata().source_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Serialize the fragment sequence to its binary artifact form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let fragments: Vec<&Fragment> = self.fragments.iter().map(AsRef::as_ref).collect();
        Ok(bincode::serialize(&fragments)?)
    }

    /// Load a fragment sequence from its binary artifact form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let fragments: Vec<Fragment> = bincode::deserialize(bytes)?;
        let mut store = Self::new();
        store.extend(fragments);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_names_dedupe_by_file_name() {
        let mut store = FragmentStore::new();
        store.extend([
            Fragment::new("a", FragmentMetadata::from_source("/data/one.txt")),
            Fragment::new("b", FragmentMetadata::from_source("other/one.txt")),
            Fragment::new("c", FragmentMetadata::from_source("two.txt")),
            Fragment::new("d", FragmentMetadata::default()),
        ]);

        assert_eq!(store.source_names(), vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn test_bytes_roundtrip_keeps_metadata() {
        let mut store = FragmentStore::new();
        let metadata = FragmentMetadata::from_source("doc.txt")
            .with_chunk_index(3)
            .with_extra("lang", "en");
        store.extend([Fragment::new("text", metadata.clone())]);

        let restored = FragmentStore::from_bytes(&store.to_bytes().unwrap()).unwrap();
        let fragment = restored.get(0).unwrap();
        assert_eq!(fragment.text(), "text");
        assert_eq!(fragment.metadata(), &metadata);
    }
}
