//! Rubric evaluation through the generative text service

use crate::error::{FitError, Result};
use crate::llm::client::{ApiKey, TextGenerator};
use crate::llm::prompts::RubricPrompt;
use crate::processing::document::Document;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Free text returned by the generative model, kept exactly as received.
/// Nothing about its structure is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RubricReport(String);

impl RubricReport {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

pub struct RubricEvaluator {
    generator: Arc<dyn TextGenerator>,
    prompt: RubricPrompt,
    model: String,
}

impl RubricEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            prompt: RubricPrompt::default(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One call to the generative service. Failures surface as
    /// `GenerationFailed` with the underlying cause; there is no partial
    /// report and no retry here.
    pub async fn evaluate(
        &self,
        credential: &ApiKey,
        candidate: &Document,
        requirement: &Document,
    ) -> Result<RubricReport> {
        let prompt = self.prompt.render(candidate, requirement);
        let start_time = Instant::now();

        info!("Requesting rubric evaluation from {}", self.model);
        let text = self
            .generator
            .complete(credential, &prompt, &self.model)
            .await
            .map_err(FitError::GenerationFailed)?;

        debug!(
            "Rubric report received: {} chars in {:.2?}",
            text.len(),
            start_time.elapsed()
        );
        Ok(RubricReport::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingGenerator {
        reply: std::result::Result<String, u16>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn complete(
            &self,
            _credential: &ApiKey,
            prompt: &str,
            model: &str,
        ) -> std::result::Result<String, GenerationError> {
            self.prompts.lock().unwrap().push((prompt.to_string(), model.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GenerationError::Api {
                    status: *status,
                    message: "rejected".to_string(),
                }),
            }
        }
    }

    fn documents() -> (Document, Document) {
        (
            Document::resume("Rust engineer, 5 years").unwrap(),
            Document::requirement("Hiring a Rust engineer").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_report_returned_unmodified() {
        let generator = Arc::new(RecordingGenerator {
            reply: Ok("  Rust: 5/5 ✅\n".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let evaluator = RubricEvaluator::new(generator.clone(), "gpt-4o-mini");
        let (resume, job) = documents();

        let report = evaluator.evaluate(&ApiKey::new("sk"), &resume, &job).await.unwrap();

        assert_eq!(report.text(), "  Rust: 5/5 ✅\n");
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Rust engineer, 5 years"));
        assert!(prompts[0].0.contains("Hiring a Rust engineer"));
        assert_eq!(prompts[0].1, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_service_failure_is_generation_failed() {
        let generator = Arc::new(RecordingGenerator {
            reply: Err(401),
            prompts: Mutex::new(Vec::new()),
        });
        let evaluator = RubricEvaluator::new(generator, "gpt-4o-mini");
        let (resume, job) = documents();

        let err = evaluator.evaluate(&ApiKey::new("sk"), &resume, &job).await.unwrap_err();
        assert!(matches!(
            err,
            FitError::GenerationFailed(GenerationError::Api { status: 401, .. })
        ));
    }
}
