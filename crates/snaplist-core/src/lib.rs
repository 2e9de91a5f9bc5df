//! Shared foundation for SnapList.
//!
//! This crate provides:
//! - Configuration schema and loading
//! - Common payload and result types
//! - ID generation utilities

pub mod config;
pub mod error;
pub mod id;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, Error};
pub use types::{
    PriceInsight, PriceRange, RecognitionPayload, SimilarityResult, SyncStats,
};

/// Core result type alias.
pub type Result<T> = std::result::Result<T, Error>;
