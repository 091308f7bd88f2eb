//! Error handling for the fit scorer

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}

impl FitError {
    /// Errors that halt a pipeline invocation outright. Everything else is
    /// scoped to the branch that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FitError::Configuration(_)
                | FitError::ExtractionFailed(_)
                | FitError::UnsupportedFormat(_)
                | FitError::InvalidInput(_)
                | FitError::Io(_)
        )
    }
}

/// Failure of a single call to the generative text service.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("service returned empty content")]
    EmptyContent,

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// Whether a caller-side retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::EmptyContent => false,
            GenerationError::Timeout(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, FitError>;

/// Model2Vec reports load failures through anyhow; the whole context chain
/// is kept in the message
impl From<anyhow::Error> for FitError {
    fn from(err: anyhow::Error) -> Self {
        FitError::ModelUnavailable(format!("{:#}", err))
    }
}
