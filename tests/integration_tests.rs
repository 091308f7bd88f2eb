//! Integration tests for document input

use resume_fit::input::InputManager;
use resume_fit::processing::document::DocumentOrigin;
use resume_fit::FitError;
use std::path::Path;

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("React"));
    assert!(text.contains("Node.js"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.md");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("React"));
    assert!(text.contains("Node.js"));
    // Should not contain markdown formatting
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_load_document_tags_origin_and_source() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_job.txt");

    let document = manager.load_document(path, DocumentOrigin::Requirement).await.unwrap();
    assert_eq!(document.origin(), DocumentOrigin::Requirement);
    assert_eq!(document.source(), Some("tests/fixtures/sample_job.txt"));
    assert!(document.content().contains("Kubernetes"));
}

#[tokio::test]
async fn test_blank_file_is_extraction_failure() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/blank.txt");

    let err = manager.extract_text(path).await.unwrap_err();
    assert!(matches!(err, FitError::ExtractionFailed(_)));
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/unsupported.xyz");

    let err = manager.extract_text(path).await.unwrap_err();
    assert!(matches!(err, FitError::UnsupportedFormat(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_nonexistent_file() {
    let manager = InputManager::new();
    let path = Path::new("tests/fixtures/nonexistent.txt");

    let err = manager.extract_text(path).await.unwrap_err();
    assert!(matches!(err, FitError::InvalidInput(_)));
}
