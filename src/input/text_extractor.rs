//! Text extraction from various file formats

use crate::error::{FitError, Result};
use pulldown_cmark::{html, Parser};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract from an in-memory PDF, e.g. an uploaded file
    pub fn extract_from_bytes(&self, bytes: &[u8], origin: &str) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            FitError::ExtractionFailed(format!("Failed to extract text from PDF '{}': {}", origin, e))
        })
    }
}

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;
        self.extract_from_bytes(&bytes, &path.display().to_string())
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(self.markdown_to_text(&markdown_content))
    }
}

impl MarkdownExtractor {
    pub fn markdown_to_text(&self, markdown: &str) -> String {
        let parser = Parser::new(markdown);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        self.html_to_text(&html_output)
    }

    fn html_to_text(&self, html: &str) -> String {
        static TAG: OnceLock<Regex> = OnceLock::new();
        let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

        let text = html
            .replace("<br>", "\n")
            .replace("</p>", "\n\n")
            .replace("&nbsp;", " ");
        let stripped = tag.replace_all(&text, "");

        let decoded = stripped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");

        decoded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_formatting_is_stripped() {
        let text = MarkdownExtractor.markdown_to_text("## Skills\n\n- **Rust** & Go\n- Kubernetes");

        assert!(text.contains("Skills"));
        assert!(text.contains("Rust & Go"));
        assert!(text.contains("Kubernetes"));
        assert!(!text.contains("**"));
        assert!(!text.contains("<li>"));
    }

    #[test]
    fn test_invalid_pdf_bytes_fail_extraction() {
        let err = PdfExtractor
            .extract_from_bytes(b"definitely not a pdf", "upload.pdf")
            .unwrap_err();
        assert!(matches!(err, FitError::ExtractionFailed(_)));
    }
}
