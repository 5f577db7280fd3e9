//! # Retrieval Engine
//!
//! This crate ties the workspace together behind one handle:
//!
//! - **Documents**: text extraction and word-window chunking
//! - **Embeddings**: the persistent nearest-neighbor index
//! - **Answer**: classification, prompting, and fallback generation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          RagEngine                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │  Document    │  │  Embedding   │  │   Answer     │           │
//! │  │  Processor   │─►│    Index     │─►│  Pipeline    │           │
//! │  └──────────────┘  └──────────────┘  └──────────────┘           │
//! │     load               search              ask                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragbot_retrieval::RagEngine;
//!
//! let engine = RagEngine::builder()
//!     .with_persist_dir("~/.local/share/ragbot/vector_index")
//!     .build()
//!     .await?;
//!
//! engine.load_documents(&["notes.txt".into()]).await;
//! let response = engine.ask("What is an embedding?", None).await;
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::{EmbeddingProviderType, GenerationConfig, IndexConfig, RagConfig, SearchConfig};
pub use engine::{
    AnswerResponse, FailedDocument, LoadReport, LoadedDocument, RagEngine, RagEngineBuilder,
    SearchHit,
};
pub use error::{Result, RetrievalError};

// Re-export from dependencies for convenience
pub use ragbot_answer::{Backends, PipelineConfig, QuestionType};
pub use ragbot_documents::{DocumentConfig, DocumentInfo, document_info, list_documents};
pub use ragbot_embeddings::{EmbeddingProvider, IndexStats};
