//! Vector similarity index for SnapList.
//!
//! This crate provides:
//! - An in-memory index of item embeddings with top-k cosine search
//! - Atomic snapshot persistence to a single local blob

pub mod error;
pub mod index;
pub mod persist;

pub use error::IndexError;
pub use index::VectorIndex;
pub use persist::IndexStore;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// A stored embedding with its metadata.
///
/// Vectors are owned by the index: records handed out are clones, and a
/// stored vector is never mutated after insert (updates replace the whole
/// record).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier.
    pub id: String,

    /// Feature vector; length always equals the index dimension.
    pub vector: Vec<f32>,

    /// Metadata.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Insert timestamp; refreshed on upsert, used as the search tiebreak.
    pub created_at: DateTime<Utc>,
}
