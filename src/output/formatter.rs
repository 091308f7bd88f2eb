//! Output formatters and report export

use crate::config::OutputFormat;
use crate::error::{FitError, Result};
use crate::output::report::FitReport;
use askama::Template;
use colored::{Color, Colorize};
use std::path::{Path, PathBuf};

/// File name used when the raw rubric report is exported into a directory
pub const DEFAULT_EXPORT_FILENAME: &str = "AI_Resume_Report.txt";

/// Trait for rendering a fit report in one output format
pub trait ReportFormatter {
    fn format_report(&self, report: &FitReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Terminal output, optionally colored
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter;

/// Dispatches to the formatter for the requested format
pub struct ReportGenerator {
    formatters: Vec<Box<dyn ReportFormatter + Send + Sync>>,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Resume Fit Report</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; max-width: 900px; margin: 0 auto; padding: 20px; background: #f5f7fa; }
        .card { background: #ffffff; border-radius: 12px; padding: 25px; margin: 15px 0; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .metrics { display: grid; grid-template-columns: 1fr 1fr; gap: 15px; }
        .metric { border-left: 4px solid #0078ff; padding: 10px 15px; }
        .metric .value { font-size: 2em; font-weight: bold; }
        .failed { color: #dc3545; font-size: 0.9em; }
        pre { white-space: pre-wrap; font-family: inherit; }
        .metadata { color: #6c757d; font-size: 0.9em; }
    </style>
</head>
<body>
    <h1 style="text-align:center; color:#0078ff">Resume Fit Report</h1>
    <div class="card metrics">
        <div class="metric">
            <div>ATS Similarity Score</div>
            <div class="value">{{ similarity }}</div>
            {% if let Some(reason) = similarity_failure.as_deref() %}<div class="failed">{{ reason }}</div>{% endif %}
        </div>
        <div class="metric">
            <div>AI Evaluation Avg</div>
            <div class="value">{{ average }}</div>
            {% if let Some(reason) = rubric_failure.as_deref() %}<div class="failed">{{ reason }}</div>{% endif %}
        </div>
    </div>
    {% if !scores.is_empty() %}
    <div class="card">
        <h2>Criterion Scores</h2>
        <ol>{% for score in scores %}<li>{{ score }}/5</li>{% endfor %}</ol>
    </div>
    {% endif %}
    {% if let Some(text) = report_text.as_deref() %}
    <div class="card">
        <h2>AI Generated Resume Feedback</h2>
        <pre>{{ text }}</pre>
    </div>
    {% endif %}
    <div class="card metadata">
        Generated {{ generated_at }} | Embedding model: {{ embedding_model }} | Generative model: {{ generation_model }} | {{ processing_time }}ms
    </div>
</body>
</html>"#
)]
struct HtmlTemplate {
    similarity: String,
    similarity_failure: Option<String>,
    average: String,
    rubric_failure: Option<String>,
    scores: Vec<String>,
    report_text: Option<String>,
    generated_at: String,
    embedding_model: String,
    generation_model: String,
    processing_time: u64,
}

fn format_score(score: f32) -> String {
    // "4.5" stays "4.5", "4.0" prints as "4"
    let formatted = format!("{:.2}", score);
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "▓".color(Color::Blue).bold(), title.color(Color::Blue).bold())
        } else {
            format!("\n{} {}\n", "▓", title)
        }
    }

    fn format_metric(&self, label: &str, display: &str, failure: Option<&str>) -> String {
        match failure {
            Some(reason) => format!(
                "{}: {} ({})\n",
                label,
                self.colorize(display, Color::Red),
                reason
            ),
            None => format!("{}: {}\n", label, self.colorize(display, Color::Green)),
        }
    }
}

impl ReportFormatter for ConsoleFormatter {
    fn format_report(&self, report: &FitReport) -> Result<String> {
        let evaluation = &report.evaluation;
        let mut output = String::new();

        output.push_str(&self.format_header("Resume Fit Analysis"));
        output.push_str(&self.format_metric(
            "ATS Similarity Score",
            &report.similarity_display(),
            evaluation.similarity.failure(),
        ));
        output.push_str(&self.format_metric(
            "AI Evaluation Avg",
            &report.average_display(),
            evaluation.rubric.failure(),
        ));

        if let Some(outcome) = evaluation.rubric.value() {
            if self.detailed {
                output.push_str(&self.format_header("Criterion Scores"));
                if outcome.raw_scores.is_empty() {
                    output.push_str("No criterion scores found in the report\n");
                }
                for (i, score) in outcome.raw_scores.iter().enumerate() {
                    output.push_str(&format!("  {}. {}/5\n", i + 1, format_score(*score)));
                }
                if outcome.raw_scores != outcome.scores {
                    let adjusted: Vec<String> = outcome.scores.iter().map(|s| format_score(*s)).collect();
                    output.push_str(&format!(
                        "  Adjusted by {:?} policy: [{}]\n",
                        outcome.policy,
                        adjusted.join(", ")
                    ));
                }
            }

            output.push_str(&self.format_header("AI Generated Resume Feedback 💡"));
            output.push_str(outcome.report.text().trim_end());
            output.push('\n');
        }

        if self.detailed {
            output.push_str(&self.format_header("Run Details"));
            output.push_str(&format!(
                "Generated: {} | Processing time: {}ms\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                evaluation.processing_time_ms
            ));
            output.push_str(&format!("Embedding model: {}\n", report.metadata.embedding_model));
            output.push_str(&format!("Generative model: {}\n", report.metadata.generation_model));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &FitReport) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format_report(&self, report: &FitReport) -> Result<String> {
        let evaluation = &report.evaluation;
        let mut content = String::new();

        content.push_str("# Resume Fit Report\n\n");
        content.push_str("| Metric | Value |\n|---|---|\n");
        content.push_str(&format!("| ATS Similarity Score | {} |\n", report.similarity_display()));
        content.push_str(&format!("| AI Evaluation Avg | {} |\n", report.average_display()));

        for (label, failure) in [
            ("ATS Similarity Score", evaluation.similarity.failure()),
            ("AI Evaluation Avg", evaluation.rubric.failure()),
        ] {
            if let Some(reason) = failure {
                content.push_str(&format!("\n> **{} unavailable:** {}\n", label, reason));
            }
        }

        if let Some(outcome) = evaluation.rubric.value() {
            if !outcome.scores.is_empty() {
                content.push_str("\n## Criterion Scores\n\n");
                for (i, score) in outcome.scores.iter().enumerate() {
                    content.push_str(&format!("{}. {}/5\n", i + 1, format_score(*score)));
                }
            }
            content.push_str("\n## AI Generated Resume Feedback\n\n");
            content.push_str(outcome.report.text().trim_end());
            content.push('\n');
        }

        if self.include_metadata {
            content.push_str("\n---\n\n");
            content.push_str(&format!(
                "*Generated {} by resume-fit {} | embedding model `{}` | generative model `{}` | {}ms*\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.tool_version,
                report.metadata.embedding_model,
                report.metadata.generation_model,
                evaluation.processing_time_ms
            ));
        }

        Ok(content)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    fn template_data(report: &FitReport) -> HtmlTemplate {
        let evaluation = &report.evaluation;
        let rubric = evaluation.rubric.value();

        HtmlTemplate {
            similarity: report.similarity_display(),
            similarity_failure: evaluation.similarity.failure().map(str::to_string),
            average: report.average_display(),
            rubric_failure: evaluation.rubric.failure().map(str::to_string),
            scores: rubric
                .map(|outcome| outcome.scores.iter().map(|s| format_score(*s)).collect())
                .unwrap_or_default(),
            report_text: rubric.map(|outcome| outcome.report.text().to_string()),
            generated_at: report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            embedding_model: report.metadata.embedding_model.clone(),
            generation_model: report.metadata.generation_model.clone(),
            processing_time: evaluation.processing_time_ms,
        }
    }
}

impl ReportFormatter for HtmlFormatter {
    fn format_report(&self, report: &FitReport) -> Result<String> {
        Self::template_data(report)
            .render()
            .map_err(|e| FitError::OutputFormatting(format!("HTML rendering failed: {}", e)))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self {
            formatters: vec![
                Box::new(ConsoleFormatter::new(use_colors, detailed)),
                Box::new(JsonFormatter::new(true)),
                Box::new(MarkdownFormatter::new(true)),
                Box::new(HtmlFormatter),
            ],
        }
    }

    pub fn generate_report(&self, report: &FitReport, format: &OutputFormat) -> Result<String> {
        self.formatters
            .iter()
            .find(|formatter| formatter.supports_format() == *format)
            .ok_or_else(|| FitError::OutputFormatting(format!("No formatter for {:?}", format)))?
            .format_report(report)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Write the raw rubric report text, unformatted. A directory target gets
/// [`DEFAULT_EXPORT_FILENAME`] inside it.
pub fn export_rubric_report(report: &FitReport, target: &Path) -> Result<PathBuf> {
    let text = report.evaluation.report_text().ok_or_else(|| {
        FitError::OutputFormatting("No rubric report to export: the evaluation failed".to_string())
    })?;

    let file_path = if target.is_dir() {
        target.join(DEFAULT_EXPORT_FILENAME)
    } else {
        target.to_path_buf()
    };

    save_report_to_file(text, &file_path)?;
    Ok(file_path)
}

/// Where `--save` writes: the path itself, or a derived file name when the
/// path is an existing directory
pub fn resolve_save_path(target: &Path, format: &OutputFormat, resume_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(suggest_filename(format, resume_name))
    } else {
        target.to_path_buf()
    }
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };

    format!("{}_fit.{}", base_name, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::evaluator::RubricReport;
    use crate::processing::document::Document;
    use crate::processing::pipeline::{BranchOutcome, FitEvaluation, RubricOutcome};
    use crate::processing::score_parser::OutOfRangePolicy;
    use tempfile::TempDir;

    fn sample_report(similarity: BranchOutcome<f32>) -> FitReport {
        let evaluation = FitEvaluation {
            similarity,
            rubric: BranchOutcome::Completed {
                value: RubricOutcome {
                    report: RubricReport::new("Skill A: 5/5 ✅\nSkill B: 7/5 <b>❌</b>"),
                    raw_scores: vec![5.0, 7.0],
                    scores: vec![5.0, 5.0],
                    policy: OutOfRangePolicy::Clamp,
                    average: 1.0,
                },
            },
            processing_time_ms: 42,
        };
        FitReport::new(
            evaluation,
            &Document::resume("resume").unwrap(),
            &Document::requirement("job").unwrap(),
            "potion-base-8M",
            "gpt-4o-mini",
        )
    }

    #[test]
    fn test_console_shows_both_metrics_and_feedback() {
        let report = sample_report(BranchOutcome::Completed { value: 0.912 });
        let output = ConsoleFormatter::new(false, true).format_report(&report).unwrap();

        assert!(output.contains("ATS Similarity Score: 0.91"));
        assert!(output.contains("AI Evaluation Avg: 1.00"));
        assert!(output.contains("Skill A: 5/5 ✅"));
        assert!(output.contains("2. 7/5"));
        assert!(output.contains("Adjusted by Clamp policy: [5, 5]"));
    }

    #[test]
    fn test_console_shows_failed_metric_reason() {
        let report = sample_report(BranchOutcome::Failed { reason: "model offline".to_string() });
        let output = ConsoleFormatter::new(false, false).format_report(&report).unwrap();

        assert!(output.contains("ATS Similarity Score: unavailable (model offline)"));
        assert!(output.contains("AI Evaluation Avg: 1.00"));
    }

    #[test]
    fn test_json_contains_branch_status() {
        let report = sample_report(BranchOutcome::Completed { value: 0.5 });
        let json = JsonFormatter::new(false).format_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["evaluation"]["similarity"]["status"], "completed");
        assert_eq!(value["evaluation"]["rubric"]["value"]["policy"], "clamp");
        assert_eq!(value["metadata"]["generation_model"], "gpt-4o-mini");
    }

    #[test]
    fn test_markdown_lists_scores() {
        let report = sample_report(BranchOutcome::Completed { value: 0.5 });
        let markdown = MarkdownFormatter::new(false).format_report(&report).unwrap();

        assert!(markdown.contains("| ATS Similarity Score | 0.50 |"));
        assert!(markdown.contains("1. 5/5"));
        assert!(markdown.contains("## AI Generated Resume Feedback"));
    }

    #[test]
    fn test_html_escapes_report_text() {
        let report = sample_report(BranchOutcome::Completed { value: 0.5 });
        let html = HtmlFormatter.format_report(&report).unwrap();

        assert!(html.contains("ATS Similarity Score"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>❌</b>"));
    }

    #[test]
    fn test_export_into_directory_uses_default_name() {
        let temp_dir = TempDir::new().unwrap();
        let report = sample_report(BranchOutcome::Completed { value: 0.5 });

        let path = export_rubric_report(&report, temp_dir.path()).unwrap();

        assert_eq!(path, temp_dir.path().join(DEFAULT_EXPORT_FILENAME));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "Skill A: 5/5 ✅\nSkill B: 7/5 <b>❌</b>");
    }

    #[test]
    fn test_export_without_report_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut report = sample_report(BranchOutcome::Completed { value: 0.5 });
        report.evaluation.rubric = BranchOutcome::Failed { reason: "timeout".to_string() };

        let err = export_rubric_report(&report, &temp_dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(err, FitError::OutputFormatting(_)));
    }

    #[test]
    fn test_generator_dispatches_on_format() {
        let report = sample_report(BranchOutcome::Completed { value: 0.5 });
        let generator = ReportGenerator::new(false, false);

        let json = generator.generate_report(&report, &OutputFormat::Json).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

        let markdown = generator.generate_report(&report, &OutputFormat::Markdown).unwrap();
        assert!(markdown.starts_with("# Resume Fit Report"));

        let html = generator.generate_report(&report, &OutputFormat::Html).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_save_into_directory_uses_suggested_name() {
        let temp_dir = TempDir::new().unwrap();

        let path = resolve_save_path(temp_dir.path(), &OutputFormat::Markdown, "docs/jane_cv.pdf");
        assert_eq!(path, temp_dir.path().join("jane_cv_fit.md"));

        let explicit = temp_dir.path().join("report.out");
        assert_eq!(resolve_save_path(&explicit, &OutputFormat::Markdown, "cv.pdf"), explicit);
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(suggest_filename(&OutputFormat::Json, "docs/jane_cv.pdf"), "jane_cv_fit.json");
        assert_eq!(suggest_filename(&OutputFormat::Html, "cv.txt"), "cv_fit.html");
    }

    #[test]
    fn test_format_score_trims_zeros() {
        assert_eq!(format_score(4.0), "4");
        assert_eq!(format_score(4.5), "4.5");
        assert_eq!(format_score(0.0), "0");
    }
}
