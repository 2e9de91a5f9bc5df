//! Embedding error types.
//!
//! These errors never leave the generator: a failed provider call or a
//! malformed image degrades to the deterministic fallback or a zero vector.

use thiserror::Error;

/// Errors that can occur while generating embeddings.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an unusable response.
    #[error("Provider error: {0}")]
    Provider(String),
}
