//! Embedding similarity scoring using Model2Vec

use crate::config::Config;
use crate::error::{FitError, Result};
use crate::processing::embedding_manager::EmbeddingModelManager;
use anyhow::Context;
use log::{debug, info, warn};
use model2vec_rs::model::StaticModel;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

/// Anything that turns text into a fixed-size dense vector.
///
/// Implementations must be deterministic for a fixed model version and safe
/// to call from several threads at once.
pub trait EmbeddingBackend: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Model2Vec static embeddings loaded from a local folder or the Hub
pub struct Model2VecBackend {
    model: StaticModel,
    model_name: String,
}

static SHARED_MODEL: OnceCell<Arc<Model2VecBackend>> = OnceCell::const_new();

impl Model2VecBackend {
    /// Load a model synchronously. This reads the full weight matrix, so
    /// callers on an async runtime should go through [`Self::shared`].
    pub fn load(repo_or_path: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", repo_or_path);

        let model = StaticModel::from_pretrained(
            repo_or_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load model '{}'", repo_or_path))?;

        info!("Model loaded successfully in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: repo_or_path.to_string(),
        })
    }

    /// Process-wide model handle, loaded on first use and reused afterwards.
    ///
    /// Only one embedding model lives in a process; asking for a different
    /// one after the first load is a configuration error.
    pub async fn shared(repo_or_path: &str) -> Result<Arc<Self>> {
        let source = repo_or_path.to_string();
        let model = SHARED_MODEL
            .get_or_try_init(|| async move {
                let loaded = tokio::task::spawn_blocking(move || Self::load(&source))
                    .await
                    .map_err(|e| FitError::ModelUnavailable(format!("Model loader panicked: {}", e)))??;
                Ok::<_, FitError>(Arc::new(loaded))
            })
            .await?;

        if model.model_name != repo_or_path {
            warn!(
                "Embedding model '{}' requested but '{}' is already loaded",
                repo_or_path, model.model_name
            );
            return Err(FitError::Configuration(format!(
                "Embedding model '{}' is already loaded for this process; cannot switch to '{}'",
                model.model_name, repo_or_path
            )));
        }

        Ok(Arc::clone(model))
    }
}

impl EmbeddingBackend for Model2VecBackend {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.encode_single(text);
        if embedding.is_empty() {
            return Err(FitError::ModelUnavailable(format!(
                "Model '{}' produced an empty embedding",
                self.model_name
            )));
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// The configured embedding model, resolved through the local catalogue.
///
/// This may fetch weights from the Hugging Face Hub. A model that fails to
/// load only disables the similarity branch, so the failure is returned as an
/// [`UnavailableBackend`] carrying the reason.
pub async fn load_configured_backend(config: &Config) -> Arc<dyn EmbeddingBackend> {
    let requested = config.models.embedding_model.clone();

    let loaded = async {
        let manager = EmbeddingModelManager::new(config.models_dir().to_path_buf()).await?;
        let source = manager.resolve_source(&requested);
        Model2VecBackend::shared(&source).await
    }
    .await;

    match loaded {
        Ok(backend) => backend as Arc<dyn EmbeddingBackend>,
        Err(e) => {
            warn!("Embedding model '{}' unavailable: {}", requested, e);
            Arc::new(UnavailableBackend::new(requested, e.to_string()))
        }
    }
}

/// Stand-in for a model that failed to load, so the similarity branch
/// reports the failure while the rest of the pipeline carries on
pub struct UnavailableBackend {
    model_name: String,
    reason: String,
}

impl UnavailableBackend {
    pub fn new(model_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            reason: reason.into(),
        }
    }
}

impl EmbeddingBackend for UnavailableBackend {
    fn encode(&self, _text: &str) -> Result<Vec<f32>> {
        Err(FitError::ModelUnavailable(self.reason.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Cosine similarity of two documents' embeddings.
#[derive(Clone)]
pub struct SimilarityScorer {
    backend: Arc<dyn EmbeddingBackend>,
}

impl SimilarityScorer {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Score two texts in `[-1, 1]`.
    ///
    /// Blank input is a caller error and is never defaulted to a score.
    pub fn score(&self, text1: &str, text2: &str) -> Result<f32> {
        if text1.trim().is_empty() || text2.trim().is_empty() {
            return Err(FitError::InvalidInput(
                "Cannot compute similarity for empty text".to_string(),
            ));
        }

        let start_time = Instant::now();
        let embedding1 = self.backend.encode(text1)?;
        let embedding2 = self.backend.encode(text2)?;
        let score = cosine_similarity(&embedding1, &embedding2)?;

        debug!(
            "Similarity {:.4} from {}-dim embeddings in {:.2?}",
            score,
            embedding1.len(),
            start_time.elapsed()
        );
        Ok(score)
    }
}

/// Cosine similarity between two embeddings, clamped into `[-1, 1]`
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(FitError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    if a.is_empty() {
        return Err(FitError::Embedding("Embeddings are empty".to_string()));
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(FitError::Embedding(
            "Cosine similarity is undefined for a zero vector".to_string(),
        ));
    }

    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32)
}
