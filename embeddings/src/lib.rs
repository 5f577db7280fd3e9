//! # Embeddings
//!
//! This crate turns text fragments into vectors and serves nearest-neighbor
//! search over them, surviving restarts through on-disk persistence.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors (Hugging Face,
//!   OpenAI, or offline feature hashing)
//! - **Similarity Search**: Cosine similarity over L2-normalized vectors
//! - **Persistence**: Index, fragments, and a model descriptor on disk
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Embedding Index                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► FlatIndex                 │
//! │                                          │ position i           │
//! │                                          ▼                      │
//! │                                   FragmentStore ──► disk        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;
pub mod store;
pub mod vector_store;

pub use error::{EmbeddingError, Result};
pub use index::{FlatIndex, Neighbor};
pub use provider::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, HashingProvider,
    HuggingFaceEmbeddings, OpenAIProvider,
};
pub use similarity::{cosine_similarity, normalize};
pub use store::{Fragment, FragmentMetadata, FragmentStore, ScoredFragment};
pub use vector_store::{EmbeddingIndex, IndexDescriptor, IndexStats};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
