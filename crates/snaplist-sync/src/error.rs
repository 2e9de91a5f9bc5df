//! Sync error types.
//!
//! Peer unavailability is not an error to callers of the store: local
//! reads and writes always succeed, and unreachable peers only delay
//! convergence. These errors surface inside relay implementations and are
//! absorbed into stats.

use thiserror::Error;

/// Errors that can occur inside the replication layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No peer could be reached for an update.
    #[error("Peer relay unreachable: {0}")]
    Unreachable(String),
}
