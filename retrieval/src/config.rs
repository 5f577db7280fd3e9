//! Configuration for the retrieval engine.
//!
//! Every section has defaults, so a TOML file only needs the keys it
//! changes. Credentials are never read from the file; providers take them
//! from `HF_TOKEN` and `OPENAI_API_KEY`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragbot_answer::{Backends, PipelineConfig};
use ragbot_documents::DocumentConfig;
use ragbot_embeddings::{EmbeddingProvider, HashingProvider, HuggingFaceEmbeddings, OpenAIProvider};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Embedding index settings.
    pub index: IndexConfig,

    /// Generation backend settings.
    pub generation: GenerationConfig,

    /// Answer pipeline thresholds and vocabularies.
    pub pipeline: PipelineConfig,

    /// Document chunking settings.
    pub documents: DocumentConfig,

    /// Search and ask defaults.
    pub search: SearchConfig,
}

impl RagConfig {
    /// Create a configuration persisting its index under `persist_dir`.
    pub fn new(persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            index: IndexConfig {
                persist_dir: persist_dir.into(),
                ..IndexConfig::default()
            },
            ..Self::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&source)
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> Result<()> {
        if self.documents.chunk_size == 0 {
            return Err(RetrievalError::Config(
                "documents.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.index.provider == EmbeddingProviderType::Hashing
            && self.index.hashing_dimension == 0
        {
            return Err(RetrievalError::Config(
                "index.hashing_dimension must be at least 1".to_string(),
            ));
        }
        if self.index.dimension == Some(0) {
            return Err(RetrievalError::Config(
                "index.dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the provider type.
    pub fn with_provider(mut self, provider: EmbeddingProviderType) -> Self {
        self.index.provider = provider;
        self
    }

    /// Set the pipeline configuration.
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the chunking configuration.
    pub fn with_documents(mut self, documents: DocumentConfig) -> Self {
        self.documents = documents;
        self
    }
}

/// Embedding index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the persisted index.
    pub persist_dir: PathBuf,

    /// Which provider computes embeddings.
    pub provider: EmbeddingProviderType,

    /// Model override for the provider.
    pub model: Option<String>,

    /// API base URL override for the provider.
    pub base_url: Option<String>,

    /// Output dimension of a remote model the provider does not know.
    pub dimension: Option<usize>,

    /// Vector dimension of the hashing provider.
    pub hashing_dimension: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("ragbot/vector_index"),
            provider: EmbeddingProviderType::HuggingFace,
            model: None,
            base_url: None,
            dimension: None,
            hashing_dimension: 512,
        }
    }
}

impl IndexConfig {
    /// Build the configured embedding provider.
    pub fn build_provider(&self) -> Arc<dyn EmbeddingProvider> {
        match self.provider {
            EmbeddingProviderType::HuggingFace => {
                let mut provider = HuggingFaceEmbeddings::new();
                if let Some(model) = &self.model {
                    provider = provider.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(dimension) = self.dimension {
                    provider = provider.with_dimension(dimension);
                }
                Arc::new(provider)
            }
            EmbeddingProviderType::OpenAI => {
                let mut provider = OpenAIProvider::new();
                if let Some(model) = &self.model {
                    provider = provider.with_model(model);
                }
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url);
                }
                if let Some(dimension) = self.dimension {
                    provider = provider.with_dimensions(dimension);
                }
                Arc::new(provider)
            }
            EmbeddingProviderType::Hashing => {
                Arc::new(HashingProvider::new(self.hashing_dimension))
            }
        }
    }
}

/// Type of embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Hugging Face feature-extraction API.
    HuggingFace,
    /// OpenAI embeddings API.
    #[serde(rename = "openai")]
    OpenAI,
    /// Offline feature hashing.
    Hashing,
}

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Inference API base URL.
    pub base_url: String,

    /// Backend for document-based and hybrid questions.
    pub primary_model: String,

    /// Backend for general questions.
    pub text_model: String,

    /// Backend of last resort.
    pub alternate_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            primary_model: "microsoft/DialoGPT-medium".to_string(),
            text_model: "google/flan-t5-base".to_string(),
            alternate_model: "gpt2".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Build the three Hugging Face backends.
    pub fn build_backends(&self) -> Backends {
        Backends::hugging_face(
            &self.base_url,
            &self.primary_model,
            &self.text_model,
            &self.alternate_model,
        )
    }
}

/// Search and ask defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned by a search without an explicit count.
    pub default_top_k: usize,

    /// Fragments retrieved to answer a question.
    pub ask_top_k: usize,

    /// Token budget of an answer without an explicit budget.
    pub max_tokens: usize,

    /// Characters of fragment text shown in a search hit.
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            ask_top_k: 3,
            max_tokens: 512,
            preview_chars: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.index.provider, EmbeddingProviderType::HuggingFace);
        assert!(config.index.persist_dir.ends_with("ragbot/vector_index"));
        assert_eq!(config.documents.chunk_size, 1000);
        assert_eq!(config.documents.chunk_overlap, 200);
        assert_eq!(config.search.ask_top_k, 3);
        assert_eq!(config.generation.text_model, "google/flan-t5-base");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [index]
            persist_dir = "/tmp/ragbot-index"
            provider = "hashing"
            hashing_dimension = 64

            [pipeline]
            high_relevance_threshold = 0.5

            [search]
            default_top_k = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.index.persist_dir, PathBuf::from("/tmp/ragbot-index"));
        assert_eq!(config.index.provider, EmbeddingProviderType::Hashing);
        assert_eq!(config.pipeline.high_relevance_threshold, 0.5);
        assert_eq!(config.pipeline.medium_relevance_threshold, 0.2);
        assert_eq!(config.search.default_top_k, 8);
        assert_eq!(config.search.max_tokens, 512);

        let provider = config.index.build_provider();
        assert_eq!(provider.default_model(), "hashing-bow-64");
    }

    #[test]
    fn test_provider_names() {
        let config = RagConfig::from_toml_str("[index]\nprovider = \"openai\"\n").unwrap();
        assert_eq!(config.index.provider, EmbeddingProviderType::OpenAI);
        let config = RagConfig::from_toml_str("[index]\nprovider = \"hugging_face\"\n").unwrap();
        assert_eq!(config.index.provider, EmbeddingProviderType::HuggingFace);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            RagConfig::from_toml_str("[documents]\nchunk_size = 0\n"),
            Err(RetrievalError::Config(_))
        ));
        assert!(matches!(
            RagConfig::from_toml_str("[index]\nprovider = \"word2vec\"\n"),
            Err(RetrievalError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_dimension_override_reaches_provider() {
        let config = RagConfig::from_toml_str(
            "[index]\nmodel = \"BAAI/bge-m3\"\ndimension = 1024\n",
        )
        .unwrap();
        let provider = config.index.build_provider();
        assert_eq!(provider.default_model(), "BAAI/bge-m3");
        assert_eq!(provider.default_dimension(), 1024);

        assert!(matches!(
            RagConfig::from_toml_str("[index]\ndimension = 0\n"),
            Err(RetrievalError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ragbot.toml");
        tokio::fs::write(&path, "[search]\nask_top_k = 4\n").await.unwrap();

        let config = RagConfig::load(&path).await.unwrap();
        assert_eq!(config.search.ask_top_k, 4);
    }
}
