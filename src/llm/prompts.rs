//! Rubric prompt for the generative evaluator

use crate::processing::document::Document;
use log::debug;

const RESUME_SLOT: &str = "{resume}";
const JOB_SLOT: &str = "{job}";

/// The fixed scoring rubric, with slots for the two documents
#[derive(Debug, Clone)]
pub struct RubricPrompt {
    template: &'static str,
}

impl Default for RubricPrompt {
    fn default() -> Self {
        Self {
            template: RUBRIC_TEMPLATE,
        }
    }
}

impl RubricPrompt {
    /// Fill the template with both documents exactly as extracted.
    ///
    /// The slots are filled in a single pass, so placeholder-like text inside
    /// a document is never substituted again.
    pub fn render(&self, resume: &Document, requirement: &Document) -> String {
        let (head, rest) = self.template.split_once(RESUME_SLOT).unwrap_or((self.template, ""));
        let (middle, tail) = rest.split_once(JOB_SLOT).unwrap_or((rest, ""));

        let mut prompt = String::with_capacity(
            self.template.len() + resume.len() + requirement.len(),
        );
        prompt.push_str(head);
        prompt.push_str(resume.content());
        prompt.push_str(middle);
        prompt.push_str(requirement.content());
        prompt.push_str(tail);

        debug!(
            "Rendered rubric prompt: {} chars (resume {}, job {})",
            prompt.len(),
            resume.len(),
            requirement.len()
        );
        prompt
    }
}

const RUBRIC_TEMPLATE: &str = r#"You are an AI Resume Analyzer.
Compare the following resume and job description.

Resume: {resume}
---
Job Description: {job}

Provide:
- A scored evaluation for every key requirement you can extract from the job description. Score each requirement from 0 to 5 and write the score exactly as "<score>/5" (for example "3/5" or "4.5/5").
- For each requirement, a status symbol: ✅ aligned, ❌ not aligned, ⚠️ unclear or partially evidenced, followed by a detailed reason that references the resume.
- Suggestions for improvement at the end, under a heading "Suggestions for Improvement".

Do not use the "/5" notation anywhere except for requirement scores."#;
