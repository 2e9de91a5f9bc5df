//! The local-first replicated graph store.

use crate::node::{GraphNode, LwwRegister, DELETED_FIELD};
use crate::relay::{FieldUpdate, PeerRelay};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the subscription broadcast channel. Slow subscribers that
/// lag past it miss intermediate states, which the idempotent-apply
/// contract already requires them to tolerate.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Replication counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Updates handed to the relay successfully.
    pub updates_sent: u64,

    /// Remote updates that changed local state.
    pub updates_applied: u64,

    /// Updates the relay could not deliver (unreachable or timed out).
    pub sends_failed: u64,

    /// Peers currently reachable.
    pub peers_connected: usize,
}

#[derive(Default)]
struct Counters {
    updates_sent: AtomicU64,
    updates_applied: AtomicU64,
    sends_failed: AtomicU64,
}

/// One peer's replica of the item/recognition graph.
///
/// `put` and `get` work purely on local state and never suspend; peer
/// propagation is fire-and-forget on a background task, bounded by a
/// timeout. An unreachable relay delays convergence but never fails a
/// local operation.
pub struct GraphStore {
    peer_id: String,
    relay: Arc<dyn PeerRelay>,
    propagation_timeout: Duration,
    nodes: RwLock<HashMap<String, GraphNode>>,
    events_tx: broadcast::Sender<GraphNode>,
    counters: Arc<Counters>,
}

impl GraphStore {
    /// Create a store for `peer_id` propagating through `relay`.
    pub fn new(peer_id: impl Into<String>, relay: Arc<dyn PeerRelay>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            peer_id: peer_id.into(),
            relay,
            propagation_timeout: Duration::from_millis(2000),
            nodes: RwLock::new(HashMap::new()),
            events_tx,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Bound each propagation attempt.
    pub fn with_propagation_timeout(mut self, timeout: Duration) -> Self {
        self.propagation_timeout = timeout;
        self
    }

    /// This replica's peer id.
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Write fields to a node.
    ///
    /// All touched fields are stamped with the current wall-clock time and
    /// this peer's id, merged locally through the same rule remote updates
    /// use, and scheduled for propagation. A local write always takes
    /// effect: when the clock has not advanced past a field's current
    /// register, the stamp is bumped one past it, so rapid rewrites within
    /// one millisecond still win the merge everywhere. Returns the merged
    /// node.
    pub fn put(
        &self,
        node_id: impl Into<String>,
        fields: HashMap<String, serde_json::Value>,
    ) -> GraphNode {
        let node_id = node_id.into();
        let now = snaplist_core::id::now_millis();

        let mut outgoing = Vec::with_capacity(fields.len());
        let node = {
            let mut nodes = self.nodes.write();
            let node = nodes
                .entry(node_id.clone())
                .or_insert_with(|| GraphNode::new(node_id.clone(), self.peer_id.clone()));

            for (field, value) in fields {
                let timestamp = match node.fields.get(&field) {
                    Some(existing) => now.max(existing.timestamp + 1),
                    None => now,
                };
                let register = LwwRegister::new(value.clone(), timestamp, self.peer_id.clone());
                node.merge_field(&field, register);
                outgoing.push(FieldUpdate {
                    node_id: node_id.clone(),
                    field,
                    value,
                    timestamp,
                    origin_peer: self.peer_id.clone(),
                });
            }
            node.clone()
        };

        self.notify(node.clone());
        self.schedule_propagation(outgoing);
        node
    }

    /// Read a node's local replica. Tombstoned nodes read as absent.
    ///
    /// Returns a copy; never blocks on the network.
    pub fn get(&self, node_id: &str) -> Option<GraphNode> {
        self.nodes
            .read()
            .get(node_id)
            .filter(|node| !node.is_deleted())
            .cloned()
    }

    /// Read a node's replica including tombstones.
    pub fn replica(&self, node_id: &str) -> Option<GraphNode> {
        self.nodes.read().get(node_id).cloned()
    }

    /// All live (non-tombstoned) nodes, copied out.
    pub fn all(&self) -> Vec<GraphNode> {
        self.nodes
            .read()
            .values()
            .filter(|node| !node.is_deleted())
            .cloned()
            .collect()
    }

    /// Tombstone a node. The marker replicates like any other field.
    pub fn remove(&self, node_id: &str) -> GraphNode {
        let mut fields = HashMap::new();
        fields.insert(DELETED_FIELD.to_string(), serde_json::Value::Bool(true));
        self.put(node_id, fields)
    }

    /// Apply an update received from a peer.
    ///
    /// Accepts iff the incoming `(timestamp, origin)` pair beats the local
    /// register. Duplicates and reordered deliveries are no-ops, so
    /// at-least-once transports need no further care.
    pub fn apply_remote(&self, update: FieldUpdate) {
        let changed = {
            let mut nodes = self.nodes.write();
            let node = nodes
                .entry(update.node_id.clone())
                .or_insert_with(|| GraphNode::new(update.node_id.clone(), update.origin_peer.clone()));

            let register = LwwRegister::new(update.value, update.timestamp, update.origin_peer);
            if node.merge_field(&update.field, register) {
                Some(node.clone())
            } else {
                None
            }
        };

        if let Some(node) = changed {
            self.counters.updates_applied.fetch_add(1, Ordering::Relaxed);
            self.notify(node);
        } else {
            debug!(node = %update.node_id, field = %update.field, "stale remote update ignored");
        }
    }

    /// Subscribe to node creates/updates matching `predicate`.
    ///
    /// Deliveries may duplicate and arrive out of order relative to other
    /// replicas; consumers apply them idempotently. Dropping the handle
    /// cancels the subscription.
    pub fn subscribe<P>(&self, predicate: P) -> Subscription
    where
        P: Fn(&GraphNode) -> bool + Send + 'static,
    {
        Subscription {
            rx: self.events_tx.subscribe(),
            predicate: Box::new(predicate),
        }
    }

    /// Current replication counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            updates_sent: self.counters.updates_sent.load(Ordering::Relaxed),
            updates_applied: self.counters.updates_applied.load(Ordering::Relaxed),
            sends_failed: self.counters.sends_failed.load(Ordering::Relaxed),
            peers_connected: self.relay.peer_count(&self.peer_id),
        }
    }

    fn notify(&self, node: GraphNode) {
        // No receivers is fine; send only fails when nobody listens.
        let _ = self.events_tx.send(node);
    }

    fn schedule_propagation(&self, updates: Vec<FieldUpdate>) {
        if updates.is_empty() {
            return;
        }

        let relay = Arc::clone(&self.relay);
        let counters = Arc::clone(&self.counters);
        let timeout = self.propagation_timeout;

        tokio::spawn(async move {
            for update in updates {
                match tokio::time::timeout(timeout, relay.broadcast(update)).await {
                    Ok(Ok(())) => {
                        counters.updates_sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Err(e)) => {
                        counters.sends_failed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "peer relay unavailable, continuing local-only");
                    }
                    Err(_) => {
                        counters.sends_failed.fetch_add(1, Ordering::Relaxed);
                        warn!("propagation timed out, continuing local-only");
                    }
                }
            }
        });
    }
}

/// Live feed of matching node updates. Dropping it cancels the feed.
pub struct Subscription {
    rx: broadcast::Receiver<GraphNode>,
    predicate: Box<dyn Fn(&GraphNode) -> bool + Send>,
}

impl Subscription {
    /// Receive the next matching node, or `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<GraphNode> {
        loop {
            match self.rx.recv().await {
                Ok(node) => {
                    if (self.predicate)(&node) {
                        return Some(node);
                    }
                }
                // Lagging skipped some intermediate states; later updates
                // carry the merged result, so just keep reading.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
