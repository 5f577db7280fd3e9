//! Tunable constants for the answer pipeline.
//!
//! The score thresholds and the repetition ratio are empirical; the
//! defaults are the values the pipeline has always shipped with.

use serde::{Deserialize, Serialize};

/// Configuration for the answer pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// A fragment scoring above this counts as high relevance.
    pub high_relevance_threshold: f32,

    /// A fragment scoring above this counts as medium relevance.
    pub medium_relevance_threshold: f32,

    /// Minimum score for a fragment to enter a document-based prompt.
    pub document_context_threshold: f32,

    /// Minimum score for a fragment to enter a hybrid prompt.
    pub hybrid_context_threshold: f32,

    /// Characters kept from each fragment in a document-based prompt.
    pub document_fragment_chars: usize,

    /// Characters kept from each fragment in a hybrid prompt.
    pub hybrid_fragment_chars: usize,

    /// Generated text of this many characters or fewer counts as a failure.
    pub min_generated_chars: usize,

    /// Final answers shorter than this are replaced by an apology.
    pub min_answer_chars: usize,

    /// A trailing sentence fragment shorter than this is dropped.
    pub trailing_fragment_chars: usize,

    /// Below this unique-word ratio an answer counts as repetitive.
    pub repetition_ratio: f32,

    /// Terms that suggest the question is about the indexed documents.
    pub document_keywords: Vec<String>,

    /// Phrases typical of generic questions.
    pub generic_keywords: Vec<String>,

    /// Generation settings for each fallback stage.
    pub stages: StageConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            high_relevance_threshold: 0.4,
            medium_relevance_threshold: 0.2,
            document_context_threshold: 0.3,
            hybrid_context_threshold: 0.2,
            document_fragment_chars: 500,
            hybrid_fragment_chars: 300,
            min_generated_chars: 10,
            min_answer_chars: 5,
            trailing_fragment_chars: 10,
            repetition_ratio: 0.3,
            document_keywords: to_strings(&[
                "machine learning",
                "ml",
                "ai",
                "artificial intelligence",
                "neural network",
                "algorithm",
                "model",
                "training",
                "data",
                "learning",
                "rag",
                "retrieval",
                "document",
                "text",
                "embedding",
                "vector",
                "classification",
                "regression",
            ]),
            generic_keywords: to_strings(&[
                "what is", "tell me", "explain", "how", "why", "when", "where", "who", "define",
                "describe", "list", "example", "help", "can you",
            ]),
            stages: StageConfig::default(),
        }
    }
}

/// Token caps and temperatures of the fallback stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Temperature of the first attempt for document-based and hybrid questions.
    pub context_temperature: f32,

    /// Temperature of the first attempt for general questions.
    pub general_temperature: f32,

    /// Token cap of the first attempt for general questions.
    pub general_max_tokens: usize,

    /// Temperature of the primary retry and the chat attempt.
    pub retry_temperature: f32,

    /// Temperature of the alternate backend.
    pub alternate_temperature: f32,

    /// Token cap of the alternate backend.
    pub alternate_max_tokens: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            context_temperature: 0.6,
            general_temperature: 0.7,
            general_max_tokens: 256,
            retry_temperature: 0.7,
            alternate_temperature: 0.8,
            alternate_max_tokens: 200,
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}
