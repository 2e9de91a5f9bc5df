//! Index error types.

use thiserror::Error;

/// Errors that can occur during index operations.
///
/// `DimensionMismatch` signals a caller bug and always propagates.
/// `WriteFailed` is retryable: the in-memory index stays valid and
/// authoritative until the next successful save.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A vector of the wrong length was handed to the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Snapshot write failed (disk full, permission denied, ...).
    #[error("Persistence write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Snapshot could not be serialized.
    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A previously saved blob could not be read back.
    #[error("Snapshot corrupt: {0}")]
    Corrupt(String),

    /// I/O error while reading a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
