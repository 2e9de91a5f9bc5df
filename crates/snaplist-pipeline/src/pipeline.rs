//! The recognition pipeline.
//!
//! One `process_recognition` call drives embedding generation, index
//! update, snapshot persistence, graph replication, neighbor search, and
//! price aggregation as a single unit of work. The pipeline owns no
//! persistent state itself; it coordinates the index and the graph store
//! it was handed at construction.

use crate::pricing;
use crate::Result;
use serde_json::json;
use snaplist_core::{id, Config, PriceInsight, RecognitionPayload, SimilarityResult, SyncStats};
use snaplist_embed::{is_zero_vector, EmbeddingGenerator, EmbeddingSource, RemoteEmbeddings};
use snaplist_index::{IndexStore, VectorIndex};
use snaplist_sync::{GraphStore, PeerRelay};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The composed result of one recognition.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecognitionOutcome {
    /// Id of the stored item.
    pub item_id: String,

    /// Similar previously seen items, own item excluded.
    pub neighbors: Vec<SimilarityResult>,

    /// Pricing guidance derived from the neighbors.
    pub price_insight: PriceInsight,

    /// Replication progress counters.
    pub sync_stats: SyncStats,
}

/// Orchestrates recognition results across the embedding, index, and sync
/// services.
pub struct Pipeline {
    config: Config,
    generator: EmbeddingGenerator,
    index: Arc<VectorIndex>,
    index_store: IndexStore,
    graph: Arc<GraphStore>,
    items_synced: AtomicU64,
    vectors_stored: AtomicU64,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline from configuration and a peer relay.
    ///
    /// Validates the config, restores the index from its snapshot (empty
    /// when none exists), and wires the generator's remote provider when
    /// one is configured.
    pub fn new(config: Config, relay: Arc<dyn PeerRelay>) -> Result<Self> {
        config.validate()?;

        let dimension = config.embedding.dimension;
        let mut generator = EmbeddingGenerator::new(dimension);
        if let Some(remote) = &config.embedding.remote {
            let provider = RemoteEmbeddings::new(&remote.endpoint, &remote.model, dimension)
                .with_timeout(Duration::from_millis(remote.timeout_ms));
            generator = generator.with_provider(Arc::new(provider));
        }

        let index_store = IndexStore::new(&config.storage.index_path);
        let index = Arc::new(index_store.load(dimension)?);

        let graph = Arc::new(
            GraphStore::new(config.peer_id(), relay)
                .with_propagation_timeout(Duration::from_millis(config.sync.propagation_timeout_ms)),
        );

        Ok(Self {
            config,
            generator,
            index,
            index_store,
            graph,
            items_synced: AtomicU64::new(0),
            vectors_stored: AtomicU64::new(0),
        })
    }

    /// The shared vector index handle.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// The shared graph store handle, for direct `get`/`subscribe` use.
    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// Process one recognition result.
    ///
    /// Partial failure policy: an unreachable sync peer degrades to
    /// local-only, a failed provider degrades to the fallback embedding,
    /// and failed search/pricing degrades to empty neighbors with zero
    /// confidence. Only a dimension mismatch or a failed snapshot write
    /// propagates; the latter is retryable and leaves the in-memory index
    /// authoritative.
    pub async fn process_recognition(
        &self,
        payload: RecognitionPayload,
    ) -> Result<RecognitionOutcome> {
        let item_id = payload.item_id.clone().unwrap_or_else(id::uuid);

        let (embedding, source) = self
            .generator
            .from_image_with_source(&payload.image_data)
            .await;
        let no_signal = is_zero_vector(&embedding);

        // The search below must observe this insert, so it happens before
        // the concurrent persistence/replication legs are joined.
        self.index
            .insert(&item_id, embedding.clone(), record_metadata(&payload, source))?;
        self.vectors_stored.fetch_add(1, Ordering::Relaxed);

        let save_leg = async { self.index_store.save(&self.index) };
        let sync_leg = async {
            self.graph.put(&item_id, item_fields(&payload));
            self.graph
                .put(format!("recognition-{}", id::uuid()), recognition_fields(&item_id, &payload));
            self.items_synced.fetch_add(1, Ordering::Relaxed);
        };

        let (saved, ()) = tokio::join!(save_leg, sync_leg);
        saved?;

        let neighbors = if no_signal {
            warn!(item_id = %item_id, "embedding carried no signal, skipping similarity ranking");
            Vec::new()
        } else {
            self.find_neighbors(&item_id, &embedding)
        };

        let price_insight = pricing::aggregate(&neighbors, &payload.category);

        info!(
            item_id = %item_id,
            neighbors = neighbors.len(),
            confidence = price_insight.confidence,
            "recognition processed"
        );

        Ok(RecognitionOutcome {
            item_id,
            neighbors,
            price_insight,
            sync_stats: self.sync_stats(),
        })
    }

    /// Top-k neighbors of `embedding`, excluding the item itself.
    fn find_neighbors(&self, item_id: &str, embedding: &[f32]) -> Vec<SimilarityResult> {
        let k = self.config.search.top_k;
        // Over-fetch by one so excluding the fresh item still yields k.
        match self.index.search(embedding, k + 1, self.config.search.min_score) {
            Ok(results) => {
                let mut neighbors: Vec<SimilarityResult> = results
                    .into_iter()
                    .filter(|result| result.id != item_id)
                    .collect();
                neighbors.truncate(k);
                neighbors
            }
            Err(e) => {
                warn!(error = %e, "similarity search failed, returning no neighbors");
                Vec::new()
            }
        }
    }

    /// Delete an item everywhere: index record, snapshot, and graph node.
    ///
    /// The graph node is tombstoned, not erased, so the deletion reaches
    /// peers.
    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        self.index.remove(item_id);
        self.index_store.save(&self.index)?;
        self.graph.remove(item_id);
        info!(item_id = %item_id, "item deleted");
        Ok(())
    }

    /// Current pipeline-wide sync counters.
    pub fn sync_stats(&self) -> SyncStats {
        let store = self.graph.stats();
        SyncStats {
            items_synced: self.items_synced.load(Ordering::Relaxed),
            vectors_stored: self.vectors_stored.load(Ordering::Relaxed),
            updates_sent: store.updates_sent,
            updates_applied: store.updates_applied,
            peers_connected: store.peers_connected,
        }
    }
}

/// Metadata stored alongside the embedding.
fn record_metadata(
    payload: &RecognitionPayload,
    source: EmbeddingSource,
) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();
    metadata.insert("name".to_string(), json!(payload.item_name));
    metadata.insert("category".to_string(), json!(payload.category));
    metadata.insert("condition".to_string(), json!(payload.condition));
    metadata.insert("price".to_string(), json!(payload.suggested_price));
    metadata.insert("confidence".to_string(), json!(payload.confidence));
    metadata.insert("source".to_string(), json!("ai_recognition"));
    metadata.insert("embedding_source".to_string(), json!(source.as_str()));
    metadata
}

/// Fields of the replicated item node.
fn item_fields(payload: &RecognitionPayload) -> HashMap<String, serde_json::Value> {
    let mut fields = HashMap::new();
    fields.insert("kind".to_string(), json!("item"));
    fields.insert("name".to_string(), json!(payload.item_name));
    fields.insert("category".to_string(), json!(payload.category));
    fields.insert("condition".to_string(), json!(payload.condition));
    fields.insert("price".to_string(), json!(payload.suggested_price));
    fields.insert("description".to_string(), json!(payload.description));
    fields.insert("confidence".to_string(), json!(payload.confidence));
    fields.insert("status".to_string(), json!("recognized"));
    fields.insert("source".to_string(), json!("ai_recognition"));
    fields
}

/// Fields of the replicated recognition event node.
fn recognition_fields(
    item_id: &str,
    payload: &RecognitionPayload,
) -> HashMap<String, serde_json::Value> {
    let mut fields = HashMap::new();
    fields.insert("kind".to_string(), json!("recognition"));
    fields.insert("item_id".to_string(), json!(item_id));
    fields.insert("confidence".to_string(), json!(payload.confidence));
    fields.insert("category".to_string(), json!(payload.category));
    fields
}
