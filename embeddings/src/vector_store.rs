//! The embedding index: fragments, their vectors, and on-disk persistence.
//!
//! Three artifacts live side by side in the persist directory: the binary
//! flat index, the binary fragment sequence, and a JSON descriptor naming
//! the embedding model. They are rewritten after every successful `add`
//! and loaded once at construction.
//!
//! The artifacts are renamed into place one after another, so a crash in
//! between can leave a mixed triple on disk. The load-time compatibility
//! checks treat such a triple as unusable and start empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::index::FlatIndex;
use crate::provider::EmbeddingProvider;
use crate::store::{Fragment, FragmentMetadata, FragmentStore, ScoredFragment};

/// File name of the serialized flat index.
pub const INDEX_FILE: &str = "vector_index.bin";

/// File name of the serialized fragment sequence.
pub const FRAGMENTS_FILE: &str = "fragments.bin";

/// File name of the JSON descriptor.
pub const METADATA_FILE: &str = "metadata.json";

/// Descriptor written next to the binary artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Identifier of the model that produced the stored vectors.
    #[serde(rename = "embedding_model")]
    pub model_identifier: String,

    /// Vector dimension.
    pub dimension: usize,

    /// Number of stored fragments.
    #[serde(rename = "document_count")]
    pub fragment_count: usize,
}

/// Summary of the index contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored fragments.
    pub total_documents: usize,

    /// Number of stored vectors. Always equal to `total_documents`.
    pub total_vectors: usize,

    /// Vector dimension.
    pub embedding_dimension: usize,

    /// Active embedding model identifier.
    pub embedding_model: String,

    /// Number of distinct source file names.
    pub unique_sources: usize,

    /// Distinct source file names, sorted.
    pub sources: Vec<String>,
}

/// Nearest-neighbor index over document fragments.
///
/// The flat index and the fragment store are always mutated together, so
/// vector `i` belongs to fragment `i`. The index provides no locking of its
/// own; hosts share it behind a lock.
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    index: FlatIndex,
    store: FragmentStore,
    persist_dir: PathBuf,
}

impl EmbeddingIndex {
    /// Open an index persisted under `persist_dir`, creating the directory
    /// if needed.
    ///
    /// A persisted index is reused only when its descriptor matches the
    /// provider's model and dimension. Anything else, including unreadable
    /// artifacts, starts an empty index and logs a warning.
    pub async fn open(
        provider: Arc<dyn EmbeddingProvider>,
        persist_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let persist_dir = persist_dir.as_ref().to_path_buf();
        fs::create_dir_all(&persist_dir).await?;

        let dimension = provider.default_dimension();
        let mut this = Self {
            provider,
            index: FlatIndex::new(dimension),
            store: FragmentStore::new(),
            persist_dir,
        };

        match this.load_persisted().await {
            Ok(Some((index, store))) => {
                info!(
                    "Loaded existing index with {} fragments from {}",
                    store.len(),
                    this.persist_dir.display()
                );
                this.index = index;
                this.store = store;
            }
            Ok(None) => {}
            Err(e) => warn!("Error loading existing index: {e}, starting fresh"),
        }

        Ok(this)
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.persist_dir.join(name)
    }

    async fn load_persisted(&self) -> Result<Option<(FlatIndex, FragmentStore)>> {
        for name in [INDEX_FILE, FRAGMENTS_FILE, METADATA_FILE] {
            if !fs::try_exists(self.artifact(name)).await? {
                info!("No existing index found, starting fresh");
                return Ok(None);
            }
        }

        let descriptor: IndexDescriptor =
            serde_json::from_str(&fs::read_to_string(self.artifact(METADATA_FILE)).await?)?;

        if descriptor.model_identifier != self.provider.default_model() {
            warn!(
                "Embedding model mismatch (persisted {}, active {}), starting fresh",
                descriptor.model_identifier,
                self.provider.default_model()
            );
            return Ok(None);
        }

        if descriptor.dimension != self.provider.default_dimension() {
            warn!(
                "Embedding dimension mismatch (persisted {}, active {}), starting fresh",
                descriptor.dimension,
                self.provider.default_dimension()
            );
            return Ok(None);
        }

        let index = FlatIndex::from_bytes(&fs::read(self.artifact(INDEX_FILE)).await?)?;
        let store = FragmentStore::from_bytes(&fs::read(self.artifact(FRAGMENTS_FILE)).await?)?;

        if index.dimension() != descriptor.dimension || index.len() != store.len() {
            warn!(
                "Persisted index is inconsistent ({} vectors, {} fragments), starting fresh",
                index.len(),
                store.len()
            );
            return Ok(None);
        }

        Ok(Some((index, store)))
    }

    /// Embed `fragments` in one provider call and append them with their
    /// metadata, then persist.
    ///
    /// Adding the same text twice stores it twice; the index never
    /// deduplicates. A provider failure leaves the index untouched.
    pub async fn add(
        &mut self,
        fragments: Vec<String>,
        metadatas: Vec<FragmentMetadata>,
    ) -> Result<()> {
        if fragments.len() != metadatas.len() {
            return Err(EmbeddingError::LengthMismatch {
                fragments: fragments.len(),
                metadatas: metadatas.len(),
            });
        }

        if fragments.is_empty() {
            debug!("No fragments to add");
            return Ok(());
        }

        let vectors = self.provider.embed_texts(&fragments).await?;
        let count = fragments.len();

        // Validates every vector before storing any of them.
        self.index.add_batch(vectors)?;
        self.store.extend(
            fragments
                .into_iter()
                .zip(metadatas)
                .map(|(text, metadata)| Fragment::new(text, metadata)),
        );

        info!("Added {count} fragments to embedding index");

        self.persist().await
    }

    /// Return up to `top_k` fragments most similar to `query`, best first.
    ///
    /// Never fails: an empty index, `top_k == 0`, or any provider error
    /// yields an empty list.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<ScoredFragment> {
        if self.index.is_empty() {
            warn!("Embedding index is empty");
            return Vec::new();
        }

        if top_k == 0 {
            warn!("Search requested with top_k = 0");
            return Vec::new();
        }

        match self.try_search(query, top_k).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Error searching fragments: {e}");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredFragment>> {
        let mut vectors = self.provider.embed_texts(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No query embedding".to_string()))?;

        let k = top_k.min(self.index.len());
        let neighbors = self.index.search(&query_vector, k)?;

        Ok(neighbors
            .into_iter()
            .filter_map(|n| {
                self.store
                    .get(n.position)
                    .map(|fragment| ScoredFragment::new(Arc::clone(fragment), n.score))
            })
            .collect())
    }

    /// Summary statistics.
    pub fn stats(&self) -> IndexStats {
        let sources = self.store.source_names();
        IndexStats {
            total_documents: self.store.len(),
            total_vectors: self.index.len(),
            embedding_dimension: self.index.dimension(),
            embedding_model: self.provider.default_model().to_string(),
            unique_sources: sources.len(),
            sources,
        }
    }

    /// Number of stored fragments.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the index holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Directory holding the persisted artifacts.
    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Descriptor for the current live state.
    pub fn descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            model_identifier: self.provider.default_model().to_string(),
            dimension: self.index.dimension(),
            fragment_count: self.store.len(),
        }
    }

    /// Drop every fragment and vector and delete the persisted artifacts.
    ///
    /// Calling this on an already empty index is a no-op.
    pub async fn clear(&mut self) -> Result<()> {
        self.index.reset();
        self.store.clear();

        for name in [INDEX_FILE, FRAGMENTS_FILE, METADATA_FILE] {
            match fs::remove_file(self.artifact(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!("Embedding index cleared");
        Ok(())
    }

    /// Write all three artifacts. Each goes to a temp file first, and the
    /// renames happen only once every temp file is written.
    async fn persist(&self) -> Result<()> {
        let artifacts = [
            (INDEX_FILE, self.index.to_bytes()?),
            (FRAGMENTS_FILE, self.store.to_bytes()?),
            (
                METADATA_FILE,
                serde_json::to_vec_pretty(&self.descriptor())?,
            ),
        ];

        for (name, bytes) in &artifacts {
            let temp_path = self.artifact(&format!("{name}.tmp"));
            fs::write(&temp_path, bytes).await?;
        }

        for (name, _) in &artifacts {
            let temp_path = self.artifact(&format!("{name}.tmp"));
            fs::rename(&temp_path, self.artifact(name)).await?;
        }

        debug!(
            "Persisted embedding index ({} fragments) to {}",
            self.store.len(),
            self.persist_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HashingProvider;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn provider() -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashingProvider::new(128))
    }

    #[tokio::test]
    async fn test_add_rejects_length_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();

        let err = index
            .add(vec!["a".to_string(), "b".to_string()], vec![FragmentMetadata::default()])
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::LengthMismatch { .. }));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_add_writes_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();

        index
            .add(
                vec!["alpha beta".to_string()],
                vec![FragmentMetadata::from_source("a.txt")],
            )
            .await
            .unwrap();

        let json = std::fs::read_to_string(temp_dir.path().join(METADATA_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "embedding_model": "hashing-bow-128",
                "dimension": 128,
                "document_count": 1
            })
        );
        assert!(!temp_dir.path().join(format!("{INDEX_FILE}.tmp")).exists());
    }

    #[tokio::test]
    async fn test_zero_top_k_returns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();
        index
            .add(vec!["alpha".to_string()], vec![FragmentMetadata::default()])
            .await
            .unwrap();

        assert!(index.search("alpha", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_artifacts_start_fresh() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();
            index
                .add(vec!["alpha".to_string()], vec![FragmentMetadata::default()])
                .await
                .unwrap();
        }
        std::fs::write(temp_dir.path().join(FRAGMENTS_FILE), b"not bincode").unwrap();

        let index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();
        assert_eq!(index.stats().total_documents, 0);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = EmbeddingIndex::open(provider(), temp_dir.path()).await.unwrap();

        index.clear().await.unwrap();
        index.clear().await.unwrap();

        assert!(index.is_empty());
    }
}
