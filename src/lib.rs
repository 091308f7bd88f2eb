//! Resume fit scoring library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod llm;
pub mod output;

pub use error::{FitError, GenerationError, Result};
pub use config::Config;
