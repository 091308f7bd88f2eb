//! Document representation for the two sides of a fit comparison

use crate::error::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the comparison a document sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentOrigin {
    Resume,
    Requirement,
}

impl fmt::Display for DocumentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOrigin::Resume => write!(f, "resume"),
            DocumentOrigin::Requirement => write!(f, "job description"),
        }
    }
}

/// Extracted plain text, immutable once built.
///
/// Construction rejects blank text, so every `Document` that reaches the
/// scorers carries real content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    origin: DocumentOrigin,
    source: Option<String>,
}

impl Document {
    pub fn new(content: impl Into<String>, origin: DocumentOrigin, source: Option<String>) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(FitError::InvalidInput(format!("{} text is empty", origin)));
        }
        Ok(Self { content, origin, source })
    }

    pub fn resume(content: impl Into<String>) -> Result<Self> {
        Self::new(content, DocumentOrigin::Resume, None)
    }

    pub fn requirement(content: impl Into<String>) -> Result<Self> {
        Self::new(content, DocumentOrigin::Requirement, None)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> DocumentOrigin {
        self.origin
    }

    /// File path or upload name the text came from, if known
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// First `max_chars` characters, cut at a word boundary where possible
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            return self.content.clone();
        }
        let truncated: String = self.content.chars().take(max_chars).collect();
        let cut = truncated.rfind(' ').unwrap_or(truncated.len());
        format!("{}...", &truncated[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new("Senior Rust engineer", DocumentOrigin::Requirement, Some("job.txt".into())).unwrap();
        assert_eq!(doc.origin(), DocumentOrigin::Requirement);
        assert_eq!(doc.source(), Some("job.txt"));
        assert_eq!(doc.content(), "Senior Rust engineer");
    }

    #[test]
    fn test_blank_document_rejected() {
        let err = Document::resume(" \n ").unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
        assert!(err.to_string().contains("resume"));
    }

    #[test]
    fn test_preview_cuts_on_word_boundary() {
        let doc = Document::resume("Built distributed systems in Rust").unwrap();
        assert_eq!(doc.preview(14), "Built...");
        assert_eq!(doc.preview(100), "Built distributed systems in Rust");
    }
}
