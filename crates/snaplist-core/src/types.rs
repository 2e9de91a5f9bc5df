//! Common payload and result types shared across the pipeline.
//!
//! Metadata values are `serde_json::Value` throughout: a tagged variant
//! (string/number/bool/null/array/map) that consumers pattern-match
//! exhaustively instead of assuming a runtime shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw AI recognition result handed to the pipeline.
///
/// Produced by an external recognition collaborator (camera + vision model);
/// the pipeline never inspects `image_data` beyond embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionPayload {
    /// Caller-supplied item id. Generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    /// Recognized item name.
    pub item_name: String,

    /// Recognized category (e.g. "Electronics").
    pub category: String,

    /// Item condition (e.g. "used", "like new").
    pub condition: String,

    /// Pre-formatted price hint from the recognizer (e.g. "$10-25").
    pub suggested_price: String,

    /// Free-text description.
    pub description: String,

    /// Recognizer confidence in [0, 1].
    pub confidence: f64,

    /// Image as a data-URI string (`data:image/png;base64,...`).
    pub image_data: String,
}

/// A single nearest-neighbor match from the vector index.
///
/// Transient: produced per search, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Matched record id.
    pub id: String,

    /// Cosine similarity in [-1, 1].
    pub score: f32,

    /// Metadata of the matched record.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A suggested price range derived from neighbor metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Pricing guidance derived from similar items plus category heuristics.
///
/// Transient: derived per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceInsight {
    /// Suggested range; `None` when no usable price signal was found.
    pub suggested_range: Option<PriceRange>,

    /// Confidence in [0, 1]; rises with neighbor count, capped at 0.9.
    pub confidence: f64,

    /// Human-readable basis for the suggestion.
    pub reasoning: Vec<String>,

    /// The raw prices extracted from neighbors.
    #[serde(default)]
    pub similar_prices: Vec<f64>,
}

impl PriceInsight {
    /// An insight carrying no price signal at all.
    pub fn no_signal() -> Self {
        Self {
            suggested_range: None,
            confidence: 0.0,
            reasoning: vec!["no price signal".to_string()],
            similar_prices: Vec::new(),
        }
    }
}

/// Counters describing local/replicated progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// Item nodes written to the graph store.
    pub items_synced: u64,

    /// Embeddings stored in the vector index.
    pub vectors_stored: u64,

    /// Field updates handed to the peer relay.
    pub updates_sent: u64,

    /// Remote field updates applied locally.
    pub updates_applied: u64,

    /// Peers currently reachable through the relay.
    pub peers_connected: usize,
}
