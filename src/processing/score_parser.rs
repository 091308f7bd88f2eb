//! Criterion score extraction from free-text rubric reports

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fixed denominator of the rubric scale
pub const MAX_POINTS: f32 = 5.0;

/// An ASCII number immediately followed by "/5". The trailing word boundary
/// keeps denominators such as "/50" or "/5pts" from being read as "/5".
const SCORE_PATTERN: &str = r"([0-9]+(?:\.[0-9]+)?)/5\b";

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SCORE_PATTERN).expect("score pattern is valid"))
}

/// Every `<number>/5` in the report, in document order.
///
/// Values are passed through exactly as written; range handling belongs to
/// [`OutOfRangePolicy`]. A report without a single match yields an empty
/// vector, never an error.
pub fn extract_scores(report: &str) -> Vec<f32> {
    let scores: Vec<f32> = score_pattern()
        .captures_iter(report)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| match m.as_str().parse::<f32>() {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("Skipping unparseable criterion score '{}': {}", m.as_str(), e);
                None
            }
        })
        .collect();

    debug!("Extracted {} criterion scores from report", scores.len());
    scores
}

/// What to do with criterion scores outside `[0, MAX_POINTS]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Pull the value back to the nearest bound
    #[default]
    Clamp,
    /// Drop the value from the sequence
    Reject,
    /// Keep the value as written
    PassThrough,
}

impl OutOfRangePolicy {
    pub fn apply(&self, scores: &[f32]) -> Vec<f32> {
        let mut adjusted = Vec::with_capacity(scores.len());

        for (index, &score) in scores.iter().enumerate() {
            if (0.0..=MAX_POINTS).contains(&score) {
                adjusted.push(score);
                continue;
            }

            match self {
                OutOfRangePolicy::Clamp => {
                    let clamped = score.clamp(0.0, MAX_POINTS);
                    warn!("Criterion {} scored {}/{}, clamped to {}", index + 1, score, MAX_POINTS, clamped);
                    adjusted.push(clamped);
                }
                OutOfRangePolicy::Reject => {
                    warn!("Criterion {} scored {}/{}, dropped", index + 1, score, MAX_POINTS);
                }
                OutOfRangePolicy::PassThrough => {
                    warn!("Criterion {} scored {}/{}, kept out of range", index + 1, score, MAX_POINTS);
                    adjusted.push(score);
                }
            }
        }

        adjusted
    }
}
