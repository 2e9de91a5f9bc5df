//! Price insight aggregation.
//!
//! Derives a suggested price range from the metadata of similar items plus
//! category heuristics. Tolerant by contract: unparsable prices are
//! dropped, and zero usable prices yields a no-signal insight, never an
//! error.

use once_cell::sync::Lazy;
use regex::Regex;
use snaplist_core::{PriceInsight, PriceRange, SimilarityResult};
use tracing::debug;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));

/// Category adjustment factors applied to the suggested range.
const CATEGORY_MULTIPLIERS: &[(&str, f64)] = &[
    ("Electronics", 1.2),
    ("Collectibles", 1.5),
    ("Clothing", 0.8),
    ("Books", 0.6),
    ("Home & Garden", 1.0),
];

/// Derive a price insight from neighbor metadata and a category.
pub fn aggregate(neighbors: &[SimilarityResult], category: &str) -> PriceInsight {
    let prices: Vec<f64> = neighbors
        .iter()
        .filter_map(|neighbor| price_from_metadata(neighbor))
        .collect();

    if prices.is_empty() {
        debug!(neighbors = neighbors.len(), "no usable price signal");
        return PriceInsight::no_signal();
    }

    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = prices.iter().sum::<f64>() / prices.len() as f64;

    let mut range = PriceRange {
        min: (0.9 * min).floor(),
        max: (1.1 * max).ceil(),
        avg,
    };

    let mut reasoning = vec![format!("Based on {} similar items", prices.len())];

    if let Some((_, multiplier)) = CATEGORY_MULTIPLIERS
        .iter()
        .find(|(name, _)| *name == category)
    {
        range.min *= multiplier;
        range.max *= multiplier;
        range.avg *= multiplier;
        reasoning.push(format!("{category} category adjustment applied"));
    }

    let confidence = (0.5 + prices.len() as f64 * 0.1).min(0.9);

    PriceInsight {
        suggested_range: Some(range),
        confidence,
        reasoning,
        similar_prices: prices,
    }
}

/// Extract a positive price from a neighbor's metadata, if any.
fn price_from_metadata(neighbor: &SimilarityResult) -> Option<f64> {
    let price = match neighbor.metadata.get("price")? {
        serde_json::Value::String(raw) => parse_price(raw)?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    (price > 0.0).then_some(price)
}

/// Tolerant parse of a price string.
///
/// `"$10-25"` becomes the midpoint 17.5; `"$15.99"` is taken literally;
/// anything without a number is `None`.
fn parse_price(raw: &str) -> Option<f64> {
    let numbers: Vec<f64> = NUMBER_RE
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match numbers.as_slice() {
        [] => None,
        [single] => Some(*single),
        [low, high, ..] if raw.contains('-') => Some((low + high) / 2.0),
        [first, ..] => Some(*first),
    }
}
