//! Embedding generation for SnapList.
//!
//! This crate provides:
//! - A pluggable `EmbeddingProvider` trait for learned feature extractors
//! - A deterministic pixel-grid fallback for images
//! - A hashed bag-of-words fallback for text
//! - Cosine similarity

pub mod error;
pub mod generator;
pub mod provider;
pub mod similarity;

pub use error::EmbedError;
pub use generator::{is_zero_vector, EmbeddingGenerator, EmbeddingSource};
pub use provider::{EmbeddingProvider, RemoteEmbeddings};
pub use similarity::cosine_similarity;

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;
