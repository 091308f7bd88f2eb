//! Presentation model for a finished fit evaluation

use crate::processing::document::Document;
use crate::processing::pipeline::FitEvaluation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the presentation layer reads: both metrics and the rubric report,
/// plus enough metadata to tell runs apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub metadata: ReportMetadata,
    pub evaluation: FitEvaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub resume_source: Option<String>,
    pub job_source: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub tool_version: String,
}

impl FitReport {
    pub fn new(
        evaluation: FitEvaluation,
        resume: &Document,
        requirement: &Document,
        embedding_model: &str,
        generation_model: &str,
    ) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                resume_source: resume.source().map(str::to_string),
                job_source: requirement.source().map(str::to_string),
                embedding_model: embedding_model.to_string(),
                generation_model: generation_model.to_string(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            evaluation,
        }
    }

    /// Similarity rounded to two decimals, or why it is missing
    pub fn similarity_display(&self) -> String {
        match self.evaluation.similarity.value() {
            Some(score) => format!("{:.2}", score),
            None => "unavailable".to_string(),
        }
    }

    /// Rubric average rounded to two decimals, or why it is missing
    pub fn average_display(&self) -> String {
        match self.evaluation.average_score() {
            Some(average) => format!("{:.2}", average),
            None => "unavailable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::evaluator::RubricReport;
    use crate::processing::pipeline::{BranchOutcome, RubricOutcome};
    use crate::processing::score_parser::OutOfRangePolicy;

    fn documents() -> (Document, Document) {
        (
            Document::new("resume", crate::processing::document::DocumentOrigin::Resume, Some("cv.pdf".into())).unwrap(),
            Document::requirement("job").unwrap(),
        )
    }

    #[test]
    fn test_displays_round_to_two_decimals() {
        let (resume, job) = documents();
        let evaluation = FitEvaluation {
            similarity: BranchOutcome::Completed { value: 0.8765 },
            rubric: BranchOutcome::Completed {
                value: RubricOutcome {
                    report: RubricReport::new("A: 3/5"),
                    raw_scores: vec![3.0],
                    scores: vec![3.0],
                    policy: OutOfRangePolicy::Clamp,
                    average: 0.6,
                },
            },
            processing_time_ms: 12,
        };

        let report = FitReport::new(evaluation, &resume, &job, "potion-base-8M", "gpt-4o-mini");

        assert_eq!(report.similarity_display(), "0.88");
        assert_eq!(report.average_display(), "0.60");
        assert_eq!(report.metadata.resume_source.as_deref(), Some("cv.pdf"));
        assert_eq!(report.metadata.job_source, None);
    }

    #[test]
    fn test_failed_branches_display_unavailable() {
        let (resume, job) = documents();
        let evaluation = FitEvaluation {
            similarity: BranchOutcome::Failed { reason: "offline".into() },
            rubric: BranchOutcome::Failed { reason: "rate limited".into() },
            processing_time_ms: 3,
        };

        let report = FitReport::new(evaluation, &resume, &job, "m", "g");
        assert_eq!(report.similarity_display(), "unavailable");
        assert_eq!(report.average_display(), "unavailable");
    }
}
