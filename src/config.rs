//! Configuration management for the fit scorer

use crate::error::{FitError, Result};
use crate::llm::client::ApiKey;
use crate::processing::score_parser::OutOfRangePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    /// Catalogue id, local directory, or Hugging Face repo id
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub api_base: String,
    pub model: String,
    /// Inline credential; takes precedence over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    /// Total attempts for the rubric call, 1 disables retries
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub out_of_range: OutOfRangePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-fit")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                embedding_model: "potion-base-8M".to_string(),
            },
            generation: GenerationConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                api_key_env: "OPENAI_API_KEY".to_string(),
                request_timeout_secs: 120,
                max_attempts: 1,
                initial_backoff_ms: 1000,
            },
            scoring: ScoringConfig {
                out_of_range: OutOfRangePolicy::Clamp,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| FitError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| FitError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-fit")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &Path {
        &self.models.models_dir
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }

    /// Resolve the generative service credential.
    ///
    /// The inline `api_key` wins over the environment variable named by
    /// `api_key_env`. Blank values are treated as absent.
    pub fn resolve_api_key(&self) -> Result<ApiKey> {
        let inline = self
            .generation
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        let key = match inline {
            Some(key) => Some(key),
            None => std::env::var(&self.generation.api_key_env)
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        };

        key.map(ApiKey::new).ok_or_else(|| {
            FitError::Configuration(format!(
                "{} not found. Set it in the environment, a .env file, or generation.api_key",
                self.generation.api_key_env
            ))
        })
    }
}
