//! Atomic snapshot persistence for the vector index.
//!
//! The whole index serializes into one JSON blob:
//! `{ vectors: [[id, [f32...]], ...], metadata: [[id, {...}], ...], timestamp }`.
//! Saves build the full new blob in a temp file and rename it over the old
//! one, so a crash mid-save never corrupts previously saved state. JSON
//! float formatting round-trips `f32` exactly, so vectors survive
//! save/load bit-for-bit.

use crate::error::IndexError;
use crate::index::VectorIndex;
use crate::{EmbeddingRecord, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    vectors: Vec<(String, Vec<f32>)>,
    metadata: Vec<(String, SnapshotMeta)>,
    timestamp: i64,
}

#[derive(Serialize, Deserialize)]
struct SnapshotMeta {
    created_at: DateTime<Utc>,
    fields: HashMap<String, serde_json::Value>,
}

/// Reads and writes the index snapshot blob at a fixed path.
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Create a store for the blob at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The blob path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Atomically persist the full index.
    pub fn save(&self, index: &VectorIndex) -> Result<()> {
        let mut records = index.records();
        // Stable blob ordering, independent of map iteration order.
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let snapshot = Snapshot {
            vectors: records
                .iter()
                .map(|r| (r.id.clone(), r.vector.clone()))
                .collect(),
            metadata: records
                .into_iter()
                .map(|r| {
                    (
                        r.id,
                        SnapshotMeta {
                            created_at: r.created_at,
                            fields: r.metadata,
                        },
                    )
                })
                .collect(),
            timestamp: Utc::now().timestamp_millis(),
        };

        let data = serde_json::to_string(&snapshot).map_err(IndexError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(IndexError::WriteFailed)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, data).map_err(IndexError::WriteFailed)?;
        fs::rename(&tmp_path, &self.path).map_err(IndexError::WriteFailed)?;

        info!(path = %self.path.display(), vectors = snapshot.vectors.len(), "index snapshot saved");
        Ok(())
    }

    /// Load an index from the blob, or an empty one when no blob exists.
    pub fn load(&self, dimension: usize) -> Result<VectorIndex> {
        if !self.path.exists() {
            return Ok(VectorIndex::new(dimension));
        }

        let data = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&data).map_err(|e| IndexError::Corrupt(e.to_string()))?;

        let mut meta: HashMap<String, SnapshotMeta> = snapshot.metadata.into_iter().collect();

        let records: Vec<EmbeddingRecord> = snapshot
            .vectors
            .into_iter()
            .map(|(id, vector)| {
                let entry = meta.remove(&id).ok_or_else(|| {
                    IndexError::Corrupt(format!("missing metadata for record {id}"))
                })?;
                Ok(EmbeddingRecord {
                    id,
                    vector,
                    metadata: entry.fields,
                    created_at: entry.created_at,
                })
            })
            .collect::<Result<_>>()?;

        VectorIndex::from_records(dimension, records)
    }
}
