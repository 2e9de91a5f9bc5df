//! In-memory vector index with top-k cosine search.

use crate::error::IndexError;
use crate::{EmbeddingRecord, Result};
use parking_lot::RwLock;
use snaplist_core::SimilarityResult;
use snaplist_embed::cosine_similarity;
use std::collections::HashMap;
use tracing::debug;

/// In-memory store of (id -> embedding, metadata) with cosine search.
///
/// One instance per device, constructed once at startup and shared by
/// handle. Reads and writes never suspend. Search is a linear scan: fine
/// for the target scale of hundreds to low thousands of records, and a
/// known scaling limit beyond that.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    records: RwLock<HashMap<String, EmbeddingRecord>>,
}

impl VectorIndex {
    /// Create an empty index with a fixed dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild an index from previously stored records.
    ///
    /// Every record must already match `dimension`.
    pub(crate) fn from_records(dimension: usize, records: Vec<EmbeddingRecord>) -> Result<Self> {
        let index = Self::new(dimension);
        for record in records {
            if record.vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: record.vector.len(),
                });
            }
            index.records.write().insert(record.id.clone(), record);
        }
        Ok(index)
    }

    /// The fixed vector dimension of this index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Insert or replace a record (idempotent upsert by id).
    ///
    /// The insert timestamp is refreshed on upsert, so a re-recognized item
    /// sorts as most recent in tie breaks.
    pub fn insert(
        &self,
        id: impl Into<String>,
        vector: Vec<f32>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let id = id.into();
        let record = EmbeddingRecord {
            id: id.clone(),
            vector,
            metadata,
            created_at: chrono::Utc::now(),
        };

        self.records.write().insert(id, record);
        Ok(())
    }

    /// Top-k cosine search with a similarity floor.
    ///
    /// Results below `min_score` are dropped; ties are broken by most
    /// recent insert first. A zero-norm vector on either side scores 0.
    pub fn search(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let records = self.records.read();

        let mut scored: Vec<(&EmbeddingRecord, f32)> = records
            .values()
            .map(|record| (record, cosine_similarity(query, &record.vector)))
            .filter(|(_, score)| *score >= min_score)
            .collect();

        scored.sort_by(|(ra, sa), (rb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| rb.created_at.cmp(&ra.created_at))
        });
        scored.truncate(k);

        debug!(candidates = records.len(), matches = scored.len(), "similarity search");

        Ok(scored
            .into_iter()
            .map(|(record, score)| SimilarityResult {
                id: record.id.clone(),
                score,
                metadata: record.metadata.clone(),
            })
            .collect())
    }

    /// Fetch a record by id, as a copy.
    pub fn get(&self, id: &str) -> Option<EmbeddingRecord> {
        self.records.read().get(id).cloned()
    }

    /// Remove a record. Removing an absent id is a no-op.
    pub fn remove(&self, id: &str) -> bool {
        self.records.write().remove(id).is_some()
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.read().contains_key(id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Snapshot all records, cloned out of the index.
    pub fn records(&self) -> Vec<EmbeddingRecord> {
        self.records.read().values().cloned().collect()
    }
}
