//! Peer relay transports.
//!
//! A relay carries per-field update messages between peers. The store only
//! requires at-least-once delivery; duplicates and reordering are handled
//! by the merge rule. Transports are pluggable behind `PeerRelay`.

use crate::error::SyncError;
use crate::store::GraphStore;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// A single replicated field write, as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Target node.
    pub node_id: String,

    /// Field name.
    pub field: String,

    /// Field value.
    pub value: serde_json::Value,

    /// Writer's wall-clock stamp in milliseconds.
    pub timestamp: i64,

    /// Writing peer's id.
    pub origin_peer: String,
}

/// Transport for propagating updates to peers.
#[async_trait]
pub trait PeerRelay: Send + Sync {
    /// Send an update to every reachable peer, at-least-once.
    async fn broadcast(&self, update: FieldUpdate) -> Result<()>;

    /// Number of peers reachable from `local_peer_id`, excluding itself.
    fn peer_count(&self, local_peer_id: &str) -> usize;
}

/// Relay with no peers. Local writes succeed; nothing propagates.
pub struct NullRelay;

#[async_trait]
impl PeerRelay for NullRelay {
    async fn broadcast(&self, _update: FieldUpdate) -> Result<()> {
        Ok(())
    }

    fn peer_count(&self, _local_peer_id: &str) -> usize {
        0
    }
}

/// In-process relay linking stores through unbounded channels.
///
/// Useful for tests and for multiple replicas inside one process. Delivery
/// is asynchronous: a task per attached store drains its channel and
/// applies updates.
#[derive(Default)]
pub struct MemoryRelay {
    peers: RwLock<Vec<(String, mpsc::UnboundedSender<FieldUpdate>)>>,
}

impl MemoryRelay {
    /// Create a relay with no attached stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a store: it will receive every future broadcast except its
    /// own writes.
    pub fn attach(&self, store: Arc<GraphStore>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<FieldUpdate>();
        self.peers.write().push((store.peer_id().to_string(), tx));

        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                debug!(node = %update.node_id, field = %update.field, "applying relayed update");
                store.apply_remote(update);
            }
        });
    }
}

#[async_trait]
impl PeerRelay for MemoryRelay {
    async fn broadcast(&self, update: FieldUpdate) -> Result<()> {
        let peers = self.peers.read();

        let mut delivered = 0;
        for (peer_id, tx) in peers.iter() {
            if *peer_id == update.origin_peer {
                continue;
            }
            // A dropped receiver is a departed peer, not an error.
            let _ = tx.send(update.clone());
            delivered += 1;
        }

        if delivered == 0 {
            return Err(SyncError::Unreachable("no peers reachable".to_string()));
        }
        Ok(())
    }

    fn peer_count(&self, local_peer_id: &str) -> usize {
        self.peers
            .read()
            .iter()
            .filter(|(peer_id, _)| peer_id != local_peer_id)
            .count()
    }
}
