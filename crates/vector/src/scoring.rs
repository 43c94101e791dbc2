//! Weighted hybrid distance

/// Distance charged for a field vector that is absent (or unusable)
pub const MISSING_DISTANCE: f64 = 1.0;

/// Cosine distance (`1 - cos θ`), matching pgvector's `<=>`
///
/// `None` when the lengths differ or either vector has zero norm; pgvector
/// yields NaN for the latter, which the ranking treats as missing.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(1.0 - dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Per-field weights of the hybrid score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub combined: f64,
    pub target_tags: f64,
    pub use_context: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            combined: 0.6,
            target_tags: 0.2,
            use_context: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Lower is more similar; missing distances count as [`MISSING_DISTANCE`]
    pub fn score(&self, combined: Option<f64>, target_tags: Option<f64>, use_context: Option<f64>) -> f64 {
        self.combined * combined.unwrap_or(MISSING_DISTANCE)
            + self.target_tags * target_tags.unwrap_or(MISSING_DISTANCE)
            + self.use_context * use_context.unwrap_or(MISSING_DISTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cosine_distance() {
        assert!(approx(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0));
        assert!(approx(cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 1.0));
        assert!(approx(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), 2.0));
    }

    #[test]
    fn test_cosine_distance_degenerate() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[], &[]), None);
    }

    #[test]
    fn test_missing_fields_cost_worst_case() {
        let weights = ScoreWeights::default();
        assert!(approx(weights.score(Some(0.0), None, None), 0.4));
        assert!(approx(weights.score(None, None, None), 1.0));
        assert!(approx(weights.score(Some(0.5), Some(0.5), Some(0.5)), 0.5));
    }
}
