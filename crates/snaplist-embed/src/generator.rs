//! Embedding generation with deterministic fallbacks.
//!
//! The generator produces a fixed-length vector from an image data-URI or a
//! text description. When a learned provider is configured it is tried
//! first; any provider failure, and any malformed input, degrades instead
//! of erroring:
//!
//! - provider unavailable or failed -> deterministic pixel-grid fallback
//! - undecodable input -> all-zero vector, logged as a warning
//!
//! Callers treat an all-zero vector as "no signal" and keep it out of
//! similarity ranking.

use crate::provider::EmbeddingProvider;
use base64::Engine;
use image::imageops::FilterType;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, warn};

/// Side length of the downsample grid used by the pixel fallback.
const FALLBACK_GRID: u32 = 32;

/// Which path produced an embedding.
///
/// Model and fallback vectors live in different spaces; callers that care
/// can tag records with this and partition, search itself does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    /// Learned provider.
    Model,
    /// Deterministic pixel-grid or bag-of-words fallback.
    Fallback,
    /// Malformed input; the vector is all zeros.
    NoSignal,
}

impl EmbeddingSource {
    /// Stable tag for metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingSource::Model => "model",
            EmbeddingSource::Fallback => "fallback",
            EmbeddingSource::NoSignal => "none",
        }
    }
}

/// Produces fixed-length feature vectors from images or text.
pub struct EmbeddingGenerator {
    dimension: usize,
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl EmbeddingGenerator {
    /// Create a generator that only uses the deterministic fallbacks.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            provider: None,
        }
    }

    /// Attach a learned embedding provider, tried before the fallback.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// The fixed output dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate an embedding from an image data-URI.
    ///
    /// Never fails: malformed input yields a zero vector, provider failure
    /// yields the pixel-grid fallback.
    pub async fn from_image(&self, data_uri: &str) -> Vec<f32> {
        self.from_image_with_source(data_uri).await.0
    }

    /// Like [`from_image`](Self::from_image), also reporting which path
    /// produced the vector.
    pub async fn from_image_with_source(&self, data_uri: &str) -> (Vec<f32>, EmbeddingSource) {
        let Some(bytes) = decode_data_uri(data_uri) else {
            warn!("malformed image data-URI, emitting zero vector");
            return (vec![0.0; self.dimension], EmbeddingSource::NoSignal);
        };

        let img = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!(error = %e, "undecodable image, emitting zero vector");
                return (vec![0.0; self.dimension], EmbeddingSource::NoSignal);
            }
        };

        if img.width() == 0 || img.height() == 0 {
            warn!("empty image, emitting zero vector");
            return (vec![0.0; self.dimension], EmbeddingSource::NoSignal);
        }

        if let Some(provider) = &self.provider {
            match provider.embed_image(&bytes).await {
                Ok(vector) => {
                    return (fit_dimension(vector, self.dimension), EmbeddingSource::Model)
                }
                Err(e) => {
                    warn!(error = %e, "embedding provider failed, using pixel fallback");
                }
            }
        }

        (self.pixel_fallback(&img), EmbeddingSource::Fallback)
    }

    /// Deterministic pixel-bucket fallback embedding.
    ///
    /// Downsamples to a fixed grid with nearest-neighbor filtering (no
    /// interpolation, so the result is reproducible), averages the color
    /// channels of each cell into [0, 1], then pads or truncates to the
    /// target dimension.
    fn pixel_fallback(&self, img: &DynamicImage) -> Vec<f32> {
        let small = img
            .resize_exact(FALLBACK_GRID, FALLBACK_GRID, FilterType::Nearest)
            .to_rgb8();

        let mut vector: Vec<f32> = small
            .pixels()
            .map(|p| (p.0[0] as f32 + p.0[1] as f32 + p.0[2] as f32) / 3.0 / 255.0)
            .collect();

        debug!(cells = vector.len(), "pixel fallback embedding generated");
        vector.resize(self.dimension, 0.0);
        vector
    }

    /// Generate an embedding from a text description.
    ///
    /// Hashed bag-of-words: each token maps through a stable string hash
    /// into one of the dimension buckets, weighted by inverse token
    /// position, then L2-normalized. Blank text yields a zero vector.
    pub fn from_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let mut tokens = 0usize;
        for (position, token) in text
            .to_lowercase()
            .split_whitespace()
            .filter(|t| !t.is_empty())
            .enumerate()
        {
            let bucket = stable_hash(token) as usize % self.dimension;
            vector[bucket] += 1.0 / (position as f32 + 1.0);
            tokens += 1;
        }

        if tokens == 0 {
            warn!("blank text input, emitting zero vector");
            return vector;
        }

        l2_normalize(&mut vector);
        vector
    }
}

/// True when every component is exactly zero ("no signal").
pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

/// Stable 32-bit string hash (`h = h*31 + c` over UTF-16 units, kept in
/// two's-complement i32). Stable across runs and platforms.
fn stable_hash(token: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in token.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

fn l2_normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for v in vector.iter_mut() {
            *v /= magnitude;
        }
    }
}

/// Zero-pad or truncate a provider vector to the index dimension.
fn fit_dimension(mut vector: Vec<f32>, dimension: usize) -> Vec<f32> {
    vector.resize(dimension, 0.0);
    vector
}

/// Extract the payload of a `data:<mime>;base64,<payload>` URI.
fn decode_data_uri(data_uri: &str) -> Option<Vec<u8>> {
    let rest = data_uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(payload).ok()
}
