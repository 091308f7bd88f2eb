//! Input manager for handling different file types

use crate::error::{FitError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::processing::document::{Document, DocumentOrigin};
use log::{debug, info};
use std::path::Path;

/// Front door for turning user-supplied files into document text.
///
/// Every successful extraction yields non-blank text; a file that decodes to
/// nothing is reported as `ExtractionFailed` instead of being scored.
#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(FitError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(FitError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    path.display()
                )));
            }
        };

        Self::ensure_content(text, &path.display().to_string())
    }

    /// Extract text from an in-memory upload of a known type
    pub fn extract_bytes(&self, bytes: &[u8], file_type: FileType, origin: &str) -> Result<String> {
        let text = match file_type {
            FileType::Pdf => PdfExtractor.extract_from_bytes(bytes, origin)?,
            FileType::Text => String::from_utf8(bytes.to_vec())
                .map_err(|e| FitError::ExtractionFailed(format!("{} is not valid UTF-8: {}", origin, e)))?,
            FileType::Markdown => {
                let markdown = std::str::from_utf8(bytes)
                    .map_err(|e| FitError::ExtractionFailed(format!("{} is not valid UTF-8: {}", origin, e)))?;
                MarkdownExtractor.markdown_to_text(markdown)
            }
            FileType::Unknown => {
                return Err(FitError::UnsupportedFormat(format!("Unsupported file type for: {}", origin)));
            }
        };

        Self::ensure_content(text, origin)
    }

    /// Extract a file and tag it with its role in the comparison
    pub async fn load_document(&self, path: &Path, origin: DocumentOrigin) -> Result<Document> {
        let text = self.extract_text(path).await?;
        Document::new(text, origin, Some(path.display().to_string()))
    }

    fn ensure_content(text: String, origin: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(FitError::ExtractionFailed(format!(
                "No text could be extracted from {}",
                origin
            )));
        }
        debug!("Extracted {} characters from {}", text.len(), origin);
        Ok(text)
    }
}
