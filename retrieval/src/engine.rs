//! Retrieval engine implementation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragbot_answer::{AnswerPipeline, Backends, QuestionType};
use ragbot_documents::{DocumentProcessor, list_documents};
use ragbot_embeddings::{
    EmbeddingIndex, EmbeddingProvider, FragmentMetadata, IndexStats, ScoredFragment,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::RagConfig;
use crate::error::{Result, RetrievalError};

/// Source name shown for fragments added without one.
const UNKNOWN_SOURCE: &str = "Unknown";

/// Question answering over a persistent embedding index.
///
/// Built once and shared by reference. The index sits behind a single
/// read-write lock: loading and clearing take the write side, search and
/// ask take the read side.
pub struct RagEngine {
    /// Configuration.
    config: RagConfig,

    /// Embedding index.
    index: Arc<RwLock<EmbeddingIndex>>,

    /// Answer pipeline.
    pipeline: AnswerPipeline,

    /// Document extraction and chunking.
    processor: DocumentProcessor,
}

impl RagEngine {
    /// Create a new engine builder.
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::new()
    }

    /// Initialize the engine with providers built from `config`.
    pub async fn new(config: RagConfig) -> Result<Self> {
        let provider = config.index.build_provider();
        let backends = config.generation.build_backends();
        Self::with_components(config, provider, backends).await
    }

    /// Initialize the engine with explicit providers.
    pub async fn with_components(
        config: RagConfig,
        provider: Arc<dyn EmbeddingProvider>,
        backends: Backends,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing engine with {} embeddings at {}",
            provider.default_model(),
            config.index.persist_dir.display()
        );

        let index = EmbeddingIndex::open(provider, &config.index.persist_dir).await?;
        let pipeline = AnswerPipeline::new(config.pipeline.clone(), backends);
        let processor = DocumentProcessor::new(config.documents);

        Ok(Self {
            config,
            index: Arc::new(RwLock::new(index)),
            pipeline,
            processor,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Extract, chunk, and index one file. Returns the number of chunks added.
    pub async fn load_document(&self, path: &Path) -> Result<usize> {
        let processor = self.processor.clone();
        let owned = path.to_path_buf();
        let chunks = tokio::task::spawn_blocking(move || processor.process(&owned))
            .await
            .map_err(|e| RetrievalError::Io(std::io::Error::other(e)))??;

        let source = path.display().to_string();
        let metadatas = (0..chunks.len())
            .map(|i| FragmentMetadata::from_source(source.clone()).with_chunk_index(i))
            .collect();
        let count = chunks.len();

        self.index.write().await.add(chunks, metadatas).await?;
        debug!("Indexed {count} chunks from {source}");
        Ok(count)
    }

    /// Index every file in `paths`, recording failures instead of stopping.
    pub async fn load_documents(&self, paths: &[PathBuf]) -> LoadReport {
        let mut report = LoadReport::default();
        for path in paths {
            match self.load_document(path).await {
                Ok(chunks) => report.loaded.push(LoadedDocument {
                    path: path.clone(),
                    chunks,
                }),
                Err(e) => {
                    warn!("Failed to load {}: {e}", path.display());
                    report.failed.push(FailedDocument {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            "Loaded {} documents ({} chunks), {} failed",
            report.loaded.len(),
            report.total_chunks(),
            report.failed.len()
        );
        report
    }

    /// Index every supported file directly inside `dir`.
    pub async fn load_directory(&self, dir: &Path) -> Result<LoadReport> {
        let owned = dir.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || list_documents(&owned))
            .await
            .map_err(|e| RetrievalError::Io(std::io::Error::other(e)))??;
        info!(
            "Found {} supported documents in {}",
            paths.len(),
            dir.display()
        );
        Ok(self.load_documents(&paths).await)
    }

    /// Ranked fragments for `query`; `top_k` defaults to the configured count.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Vec<SearchHit> {
        let top_k = top_k.unwrap_or(self.config.search.default_top_k);
        let results = self.index.read().await.search(query, top_k).await;
        results
            .iter()
            .map(|r| SearchHit::from_scored(r, self.config.search.preview_chars))
            .collect()
    }

    /// Answer `question` from the most relevant fragments.
    pub async fn ask(&self, question: &str, max_tokens: Option<usize>) -> AnswerResponse {
        let max_tokens = max_tokens.unwrap_or(self.config.search.max_tokens);
        let fragments = self
            .index
            .read()
            .await
            .search(question, self.config.search.ask_top_k)
            .await;

        let answer = self.pipeline.answer(question, &fragments, max_tokens).await;
        let sources: BTreeSet<String> = fragments.iter().map(source_name).collect();

        AnswerResponse {
            answer: answer.text,
            question_type: answer.question_type,
            sources: sources.into_iter().collect(),
            relevant_fragments: fragments.len(),
        }
    }

    /// Index statistics.
    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    /// Drop every fragment and the persisted artifacts.
    pub async fn clear(&self) -> Result<()> {
        if let Err(e) = self.index.write().await.clear().await {
            error!("Failed to clear index: {e}");
            return Err(e.into());
        }
        info!("Index cleared");
        Ok(())
    }

    /// Whether the primary generation backend answers.
    pub async fn check_connection(&self) -> bool {
        self.pipeline.check_connection().await
    }
}

/// Builder for [`RagEngine`].
pub struct RagEngineBuilder {
    config: RagConfig,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    backends: Option<Backends>,
}

impl RagEngineBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: RagConfig::default(),
            provider: None,
            backends: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: RagConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the index directory.
    pub fn with_persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index.persist_dir = dir.into();
        self
    }

    /// Use this embedding provider instead of the configured one.
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use these generation backends instead of the configured ones.
    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = Some(backends);
        self
    }

    /// Build the engine.
    pub async fn build(self) -> Result<RagEngine> {
        let provider = self
            .provider
            .unwrap_or_else(|| self.config.index.build_provider());
        let backends = self
            .backends
            .unwrap_or_else(|| self.config.generation.build_backends());
        RagEngine::with_components(self.config, provider, backends).await
    }
}

impl Default for RagEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`RagEngine::load_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Files that were indexed.
    pub loaded: Vec<LoadedDocument>,

    /// Files that could not be indexed.
    pub failed: Vec<FailedDocument>,
}

impl LoadReport {
    /// Chunks added across all loaded files.
    pub fn total_chunks(&self) -> usize {
        self.loaded.iter().map(|d| d.chunks).sum()
    }

    /// Append the entries of another report.
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded.extend(other.loaded);
        self.failed.extend(other.failed);
    }
}

/// A file that was indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub chunks: usize,
}

/// A file that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub error: String,
}

/// One search result, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// File name of the fragment's source.
    pub source: String,

    /// Position of the fragment within its source.
    pub chunk_index: Option<usize>,

    /// Relevance score.
    pub score: f32,

    /// Leading characters of the fragment, with "..." when cut.
    pub preview: String,
}

impl SearchHit {
    fn from_scored(result: &ScoredFragment, preview_chars: usize) -> Self {
        let text = result.fragment.text();
        let mut preview: String = text.chars().take(preview_chars).collect();
        if text.chars().count() > preview_chars {
            preview.push_str("...");
        }
        Self {
            source: source_name(result),
            chunk_index: result.fragment.metadata().chunk_index,
            score: result.score,
            preview,
        }
    }
}

/// Answer to a question together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Final answer text.
    pub answer: String,

    /// How the question was answered.
    pub question_type: Option<QuestionType>,

    /// Distinct source file names of the retrieved fragments, sorted.
    pub sources: Vec<String>,

    /// Number of fragments retrieved for the question.
    pub relevant_fragments: usize,
}

fn source_name(result: &ScoredFragment) -> String {
    result
        .fragment
        .metadata()
        .source_name()
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragbot_embeddings::{Fragment, HashingProvider};
    use tempfile::TempDir;

    fn scored(text: &str, metadata: FragmentMetadata) -> ScoredFragment {
        ScoredFragment::new(Arc::new(Fragment::new(text, metadata)), 0.5)
    }

    #[tokio::test]
    async fn test_builder_pattern() {
        let temp_dir = TempDir::new().unwrap();

        let engine = RagEngine::builder()
            .with_persist_dir(temp_dir.path())
            .with_embedding_provider(Arc::new(HashingProvider::new(32)))
            .build()
            .await
            .unwrap();

        assert_eq!(engine.config().index.persist_dir, temp_dir.path());
        assert_eq!(engine.stats().await.embedding_model, "hashing-bow-32");
    }

    #[test]
    fn test_hit_preview_and_source() {
        let hit = SearchHit::from_scored(
            &scored(
                "abcdef",
                FragmentMetadata::from_source("/data/notes/a.txt").with_chunk_index(3),
            ),
            4,
        );
        assert_eq!(hit.source, "a.txt");
        assert_eq!(hit.chunk_index, Some(3));
        assert_eq!(hit.preview, "abcd...");

        let hit = SearchHit::from_scored(&scored("abcd", FragmentMetadata::default()), 4);
        assert_eq!(hit.source, UNKNOWN_SOURCE);
        assert_eq!(hit.preview, "abcd");
    }
}
