//! Fit-scoring pipeline: embedding similarity and rubric evaluation run as
//! two independent branches and are reported side by side.

use crate::config::Config;
use crate::error::{FitError, GenerationError, Result};
use crate::llm::client::{ApiKey, TextGenerator};
use crate::llm::evaluator::{RubricEvaluator, RubricReport};
use crate::processing::aggregator::aggregate;
use crate::processing::document::{Document, DocumentOrigin};
use crate::processing::embeddings::{load_configured_backend, EmbeddingBackend, SimilarityScorer};
use crate::processing::score_parser::{extract_scores, OutOfRangePolicy};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Caller-side retry around the single-call rubric evaluator.
/// Only retryable generation errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt` (1-based); doubles each time
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        self.initial_backoff.saturating_mul(1 << exponent)
    }

    fn should_retry(&self, attempt: u32, error: &FitError) -> bool {
        attempt < self.max_attempts
            && matches!(error, FitError::GenerationFailed(cause) if cause.is_retryable())
    }
}

/// Result of one branch. A failed branch keeps its reason for display
/// and never hides the other branch's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BranchOutcome<T> {
    Completed { value: T },
    Failed { reason: String },
}

impl<T> BranchOutcome<T> {
    fn from_result(branch: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => BranchOutcome::Completed { value },
            Err(e) => {
                warn!("{} branch failed: {}", branch, e);
                BranchOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            BranchOutcome::Completed { value } => Some(value),
            BranchOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            BranchOutcome::Completed { .. } => None,
            BranchOutcome::Failed { reason } => Some(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BranchOutcome::Failed { .. })
    }
}

/// Everything the rubric branch produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricOutcome {
    pub report: RubricReport,
    /// Scores exactly as extracted from the report
    pub raw_scores: Vec<f32>,
    /// Scores after the out-of-range policy, the input to `aggregate`
    pub scores: Vec<f32>,
    pub policy: OutOfRangePolicy,
    /// Normalized average in `[0, 1]` unless the policy passes values through
    pub average: f32,
}

/// The two fit signals, kept separate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitEvaluation {
    /// Cosine similarity of the document embeddings
    pub similarity: BranchOutcome<f32>,
    pub rubric: BranchOutcome<RubricOutcome>,
    pub processing_time_ms: u64,
}

impl FitEvaluation {
    pub fn average_score(&self) -> Option<f32> {
        self.rubric.value().map(|outcome| outcome.average)
    }

    pub fn report_text(&self) -> Option<&str> {
        self.rubric.value().map(|outcome| outcome.report.text())
    }

    pub fn all_failed(&self) -> bool {
        self.similarity.is_failed() && self.rubric.is_failed()
    }
}

pub struct FitPipeline {
    scorer: SimilarityScorer,
    evaluator: RubricEvaluator,
    credential: ApiKey,
    request_timeout: Duration,
    retry: RetryPolicy,
    policy: OutOfRangePolicy,
}

impl FitPipeline {
    /// Build a pipeline. The generative service credential is resolved here,
    /// so a missing key fails before anything touches the network.
    pub fn new(
        config: &Config,
        embedding_backend: Arc<dyn EmbeddingBackend>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let credential = config.resolve_api_key()?;
        Ok(Self::assemble(config, credential, embedding_backend, generator))
    }

    /// Build a pipeline around the configured embedding model.
    ///
    /// The credential is resolved before the model is looked up, since a
    /// model that is not on disk yet is fetched from the Hub.
    pub async fn from_config(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let credential = config.resolve_api_key()?;
        let embedding_backend = load_configured_backend(config).await;
        Ok(Self::assemble(config, credential, embedding_backend, generator))
    }

    fn assemble(
        config: &Config,
        credential: ApiKey,
        embedding_backend: Arc<dyn EmbeddingBackend>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            scorer: SimilarityScorer::new(embedding_backend),
            evaluator: RubricEvaluator::new(generator, config.generation.model.clone()),
            credential,
            request_timeout: config.request_timeout(),
            retry: RetryPolicy::new(
                config.generation.max_attempts,
                Duration::from_millis(config.generation.initial_backoff_ms),
            ),
            policy: config.scoring.out_of_range,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn embedding_model(&self) -> &str {
        self.scorer.model_name()
    }

    pub fn generation_model(&self) -> &str {
        self.evaluator.model()
    }

    /// Score a resume against a job description.
    ///
    /// Returns `Err` only for problems with the inputs themselves. Model and
    /// service failures are scoped to their branch inside the evaluation.
    pub async fn run(&self, resume: &Document, requirement: &Document) -> Result<FitEvaluation> {
        if resume.origin() != DocumentOrigin::Resume || requirement.origin() != DocumentOrigin::Requirement {
            return Err(FitError::InvalidInput(format!(
                "Expected a resume and a job description, got {} and {}",
                resume.origin(),
                requirement.origin()
            )));
        }

        let start_time = Instant::now();
        info!("Scoring resume against job description");

        let (similarity, rubric) = tokio::join!(
            self.similarity_branch(resume, requirement),
            self.rubric_branch(resume, requirement),
        );

        let evaluation = FitEvaluation {
            similarity: BranchOutcome::from_result("Similarity", similarity),
            rubric: BranchOutcome::from_result("Rubric", rubric),
            processing_time_ms: u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!("Fit scoring finished in {}ms", evaluation.processing_time_ms);
        Ok(evaluation)
    }

    /// Embedding inference is CPU-bound, so it runs on the blocking pool
    async fn similarity_branch(&self, resume: &Document, requirement: &Document) -> Result<f32> {
        let scorer = self.scorer.clone();
        let resume_text = resume.content().to_string();
        let requirement_text = requirement.content().to_string();

        tokio::task::spawn_blocking(move || scorer.score(&resume_text, &requirement_text))
            .await
            .map_err(|e| FitError::ModelUnavailable(format!("Embedding task aborted: {}", e)))?
    }

    async fn rubric_branch(&self, resume: &Document, requirement: &Document) -> Result<RubricOutcome> {
        let report = self.evaluate_with_retry(resume, requirement).await?;

        let raw_scores = extract_scores(report.text());
        let scores = self.policy.apply(&raw_scores);
        let average = aggregate(&scores);

        if raw_scores.is_empty() {
            warn!("No criterion scores found in the rubric report; average defaults to 0.0");
        }

        Ok(RubricOutcome {
            report,
            raw_scores,
            scores,
            policy: self.policy,
            average,
        })
    }

    /// Each attempt is bounded by the request timeout. Dropping the timed-out
    /// future cancels the in-flight request.
    async fn evaluate_with_retry(&self, resume: &Document, requirement: &Document) -> Result<RubricReport> {
        let mut attempt = 1;
        loop {
            let call = self.evaluator.evaluate(&self.credential, resume, requirement);
            let error = match tokio::time::timeout(self.request_timeout, call).await {
                Ok(Ok(report)) => return Ok(report),
                Ok(Err(e)) => e,
                Err(_) => FitError::GenerationFailed(GenerationError::Timeout(self.request_timeout)),
            };

            if !self.retry.should_retry(attempt, &error) {
                return Err(error);
            }

            attempt += 1;
            let delay = self.retry.backoff(attempt);
            warn!(
                "Rubric evaluation failed ({}), attempt {}/{} in {}ms",
                error,
                attempt,
                self.retry.max_attempts(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(100));
        assert_eq!(retry.backoff(3), Duration::from_millis(200));
        assert_eq!(retry.backoff(4), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_only_retryable_generation_errors_retry() {
        let retry = RetryPolicy::new(3, Duration::ZERO);
        let rate_limited = FitError::GenerationFailed(GenerationError::Api {
            status: 429,
            message: "slow down".to_string(),
        });
        let unauthorized = FitError::GenerationFailed(GenerationError::Api {
            status: 401,
            message: "bad key".to_string(),
        });

        assert!(retry.should_retry(1, &rate_limited));
        assert!(retry.should_retry(2, &rate_limited));
        assert!(!retry.should_retry(3, &rate_limited));
        assert!(!retry.should_retry(1, &unauthorized));
        assert!(!retry.should_retry(1, &FitError::Configuration("x".to_string())));
        assert!(!RetryPolicy::none().should_retry(1, &rate_limited));
    }

    #[test]
    fn test_branch_outcome_serialization() {
        let completed: BranchOutcome<f32> = BranchOutcome::Completed { value: 0.5 };
        let failed: BranchOutcome<f32> = BranchOutcome::Failed { reason: "offline".to_string() };

        assert_eq!(
            serde_json::to_value(&completed).unwrap(),
            serde_json::json!({"status": "completed", "value": 0.5})
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({"status": "failed", "reason": "offline"})
        );
        assert_eq!(failed.failure(), Some("offline"));
        assert_eq!(completed.value(), Some(&0.5));
    }
}
