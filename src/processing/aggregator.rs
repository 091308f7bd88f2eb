//! Aggregation of criterion scores into a single fit metric

use crate::processing::score_parser::MAX_POINTS;

/// Normalized mean of the criterion scores.
///
/// `sum / (MAX_POINTS * count)`, or 0.0 when nothing was extracted. The
/// result is not clamped; whether it can leave `[0, 1]` depends on the
/// out-of-range policy applied upstream.
pub fn aggregate(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f32 = scores.iter().sum();
    total / (MAX_POINTS * scores.len() as f32)
}
