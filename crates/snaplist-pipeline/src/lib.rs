//! Recognition pipeline orchestration for SnapList.
//!
//! This crate provides:
//! - The pipeline driving embedding, indexing, persistence, replication,
//!   and neighbor search as one unit of work
//! - Price insight aggregation from neighbor metadata

pub mod error;
pub mod pipeline;
pub mod pricing;

pub use error::PipelineError;
pub use pipeline::{Pipeline, RecognitionOutcome};
pub use pricing::aggregate;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
