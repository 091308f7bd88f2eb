//! Embedding model catalogue, download, and path resolution

use crate::error::{FitError, Result};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Information about an available embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub dimensions: u32,
}

/// Tracks which catalogue models exist locally and fetches the rest
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, EmbeddingModelInfo>,
    downloaded_models: HashSet<String>,
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            FitError::Configuration(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        let mut manager = Self {
            models_dir,
            available_models: Self::catalogue(),
            downloaded_models: HashSet::new(),
        };
        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    fn catalogue() -> BTreeMap<String, EmbeddingModelInfo> {
        let mut models = BTreeMap::new();

        models.insert(
            "potion-base-8M".to_string(),
            EmbeddingModelInfo {
                name: "Potion Base 8M".to_string(),
                repo_id: "minishlab/potion-base-8M".to_string(),
                size_mb: 33,
                description: "Default Model2Vec model, good quality for its size".to_string(),
                dimensions: 256,
            },
        );
        models.insert(
            "m2v-base".to_string(),
            EmbeddingModelInfo {
                name: "Model2Vec Base".to_string(),
                repo_id: "minishlab/M2V_base_output".to_string(),
                size_mb: 90,
                description: "Legacy Model2Vec base embeddings model".to_string(),
                dimensions: 256,
            },
        );
        models.insert(
            "m2v-large".to_string(),
            EmbeddingModelInfo {
                name: "Model2Vec Large".to_string(),
                repo_id: "minishlab/M2V_large_output".to_string(),
                size_mb: 250,
                description: "Higher-capacity Model2Vec model".to_string(),
                dimensions: 512,
            },
        );

        models
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let model_name = entry.file_name().to_string_lossy().to_string();
            if Self::is_valid_model_directory(&entry.path()).await {
                self.downloaded_models.insert(model_name);
            }
        }

        Ok(())
    }

    /// Model2Vec needs a tokenizer, weights, and config side by side
    async fn is_valid_model_directory(path: &Path) -> bool {
        for file in ["tokenizer.json", "model.safetensors", "config.json"] {
            if fs::metadata(path.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Download a catalogue model from the Hugging Face Hub
    pub async fn download_model(&mut self, model_id: &str, force: bool) -> Result<PathBuf> {
        let model_id = self
            .resolve_model_id(model_id)
            .ok_or_else(|| FitError::ModelNotFound(model_id.to_string()))?;
        let model_info = self.available_models[&model_id].clone();
        let model_dir = self.models_dir.join(&model_id);

        if self.downloaded_models.contains(&model_id) && !force {
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            model_info.name, model_info.size_mb, model_info.repo_id
        );

        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| FitError::ModelUnavailable(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(model_info.repo_id.clone());

        for file in ["model.safetensors", "tokenizer.json", "config.json", "README.md"] {
            match repo.get(file).await {
                Ok(cached_path) => {
                    fs::copy(&cached_path, model_dir.join(file)).await?;
                    info!("Downloaded {}", file);
                }
                Err(e) if file == "README.md" => {
                    warn!("Optional file {} not found: {}", file, e);
                }
                Err(e) => {
                    return Err(FitError::ModelUnavailable(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded_models.insert(model_id);
        Ok(model_dir)
    }

    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.downloaded_models
            .contains(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    /// Turn a configured model name into something the Model2Vec loader
    /// accepts: a local directory for downloaded catalogue models, the repo
    /// id for catalogue models not yet on disk, anything else verbatim.
    pub fn resolve_source(&self, input: &str) -> String {
        match self.resolve_model_id(input) {
            Some(id) => match self.get_model_path(&id) {
                Some(path) => path.to_string_lossy().into_owned(),
                None => self.available_models[&id].repo_id.clone(),
            },
            None => input.to_string(),
        }
    }

    /// Sorted by catalogue id
    pub fn list_available_models(&self) -> Vec<(&str, &EmbeddingModelInfo)> {
        self.available_models
            .iter()
            .map(|(id, info)| (id.as_str(), info))
            .collect()
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }

    /// Match a catalogue id, repo id, or display name (case-insensitive)
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.available_models.contains_key(input) {
            return Some(input.to_string());
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|(_, info)| info.repo_id == input || info.name.to_lowercase() == input_lower)
            .map(|(id, _)| id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manager_creation_scans_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().join("models")).await.unwrap();

        assert_eq!(manager.list_available_models().len(), 3);
        assert!(!manager.is_model_downloaded("potion-base-8M"));
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(manager.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("minishlab/potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("potion base 8m"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("unknown/model"), None);
    }

    #[tokio::test]
    async fn test_resolve_source_prefers_local_copy() {
        let temp_dir = TempDir::new().unwrap();
        let model_dir = temp_dir.path().join("m2v-base");
        std::fs::create_dir_all(&model_dir).unwrap();
        for file in ["tokenizer.json", "model.safetensors", "config.json"] {
            std::fs::write(model_dir.join(file), b"{}").unwrap();
        }

        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(manager.is_model_downloaded("m2v-base"));
        assert_eq!(manager.resolve_source("m2v-base"), model_dir.to_string_lossy().into_owned());
        assert_eq!(manager.resolve_source("potion-base-8M"), "minishlab/potion-base-8M");
        assert_eq!(manager.resolve_source("/opt/models/custom"), "/opt/models/custom");
    }

    #[tokio::test]
    async fn test_unknown_download_is_model_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        let err = manager.download_model("not-a-model", false).await.unwrap_err();
        assert!(matches!(err, FitError::ModelNotFound(_)));
    }
}
