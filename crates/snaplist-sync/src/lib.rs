//! Peer-replicated graph store for SnapList.
//!
//! This crate provides:
//! - Graph nodes whose fields are last-writer-wins registers
//! - A local-first store: reads and writes never touch the network
//! - Fire-and-forget propagation through a pluggable peer relay
//! - Live subscriptions with explicit cancellation handles
//!
//! Convergence: every field merge is total and commutative (timestamp,
//! then lexicographic peer id), so replicas that see the same set of
//! updates in any order, with any duplication, end in the same state.

pub mod error;
pub mod node;
pub mod relay;
pub mod store;

pub use error::SyncError;
pub use node::{GraphNode, LwwRegister, DELETED_FIELD};
pub use relay::{FieldUpdate, MemoryRelay, NullRelay, PeerRelay};
pub use store::{GraphStore, StoreStats, Subscription};

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
