//! Pipeline error types.
//!
//! Only two conditions propagate to callers: a dimension mismatch (a
//! caller bug) and a failed snapshot write (retryable; the in-memory index
//! stays authoritative). Embedding, sync, and pricing failures degrade the
//! result instead.

use snaplist_core::error::ConfigError;
use snaplist_index::IndexError;
use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration rejected at construction.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Index error: dimension mismatch or snapshot write failure.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}
