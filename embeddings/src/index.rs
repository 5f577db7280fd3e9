//! Exact inner-product index over unit-length vectors.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{dot_product, normalize, top_k_by_score};

/// A nearest-neighbor hit: the position of a stored vector and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the matched vector.
    pub position: usize,

    /// Inner product with the query (cosine similarity for unit vectors).
    pub score: f32,
}

/// A flat index that scores every stored vector against the query.
///
/// Vectors are kept in insertion order, so a vector's position doubles as
/// its identifier. Every stored vector is L2-normalized on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    /// Expected dimension of embeddings.
    dimension: usize,

    /// Stored vectors, in insertion order.
    vectors: Vec<Embedding>,
}

impl FlatIndex {
    /// Create a new empty index.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Dimension every vector in this index must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a batch of vectors.
    ///
    /// The whole batch is validated before anything is stored, so a bad
    /// vector leaves the index unchanged.
    pub fn add_batch(&mut self, vectors: Vec<Embedding>) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        let count = vectors.len();
        for mut vector in vectors {
            normalize(&mut vector);
            self.vectors.push(vector);
        }

        debug!("Added {count} vectors to flat index ({} total)", self.len());
        Ok(())
    }

    /// Search for the `k` vectors closest to `query`.
    ///
    /// Results are ordered by descending score; ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored = Vec::with_capacity(self.vectors.len());
        for (position, vector) in self.vectors.iter().enumerate() {
            scored.push((position, dot_product(&query, vector)?));
        }

        Ok(top_k_by_score(scored, k)
            .into_iter()
            .map(|(position, score)| Neighbor { position, score })
            .collect())
    }

    /// Drop every stored vector, keeping the dimension.
    pub fn reset(&mut self) {
        self.vectors.clear();
        info!("Reset flat index");
    }

    /// Serialize the index to its binary artifact form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Load an index from its binary artifact form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let index: Self = bincode::deserialize(bytes)?;

        if let Some(bad) = index.vectors.iter().find(|v| v.len() != index.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: index.dimension,
                actual: bad.len(),
            });
        }

        info!("Loaded {} vectors into flat index", index.len());
        Ok(index)
    }
}
