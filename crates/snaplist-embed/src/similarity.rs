//! Cosine similarity.

/// Compute cosine similarity between two vectors.
///
/// A zero-norm vector on either side yields `0.0`, never `NaN`. Length
/// mismatch also yields `0.0`; the vector index rejects mismatched
/// dimensions before scoring, so that case only arises for ad-hoc callers.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
