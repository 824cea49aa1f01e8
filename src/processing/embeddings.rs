//! Embedding provider boundary and vector similarity

use crate::error::ProviderError;
use async_trait::async_trait;
use model2vec_rs::model::StaticModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// External text-embedding model. Constructed once at start-up and injected
/// into the engine; implementations must not retry internally.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    fn model_name(&self) -> &str;
}

/// An L2-normalized, immutable embedding vector. Cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Arc<[f32]>);

impl Embedding {
    /// Validates and L2-normalizes raw provider output. A zero vector is
    /// kept as is and has cosine 0 with everything.
    pub fn from_raw(raw: Vec<f32>) -> std::result::Result<Self, ProviderError> {
        if raw.is_empty() {
            return Err(ProviderError::Malformed("empty embedding vector".to_string()));
        }
        if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
            return Err(ProviderError::Malformed(format!(
                "non-finite value at index {}",
                index
            )));
        }

        let norm = raw.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Ok(Self(raw.into()));
        }

        let normalized: Vec<f32> = raw.iter().map(|v| (*v as f64 / norm) as f32).collect();
        Ok(Self(normalized.into()))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity in [-1, 1].
    pub fn cosine(&self, other: &Embedding) -> std::result::Result<f32, ProviderError> {
        if self.dimension() != other.dimension() {
            return Err(ProviderError::DimensionMismatch {
                left: self.dimension(),
                right: other.dimension(),
            });
        }

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
    }
}

/// Clamp a cosine into [0, 1]; anything non-finite counts as no similarity.
pub fn clamped_similarity(cosine: f32) -> f32 {
    if cosine.is_finite() {
        cosine.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `round(100 * clamped cosine)`.
pub fn semantic_score(cosine: f32) -> u8 {
    (100.0 * clamped_similarity(cosine)).round() as u8
}

/// Model2Vec static embeddings, loaded once and shared.
pub struct Model2VecProvider {
    model: Arc<StaticModel>,
    model_name: String,
}

impl Model2VecProvider {
    /// Loads from a local model directory or a HuggingFace repo id. Runs on a
    /// blocking thread since loading may download and parse large files.
    pub async fn load(source: ModelSource) -> std::result::Result<Self, ProviderError> {
        let start_time = Instant::now();
        let model_name = source.name().to_string();
        let location = source.location();

        log::info!("Loading Model2Vec embedding model from: {}", location.display());

        let model = tokio::task::spawn_blocking(move || StaticModel::from_pretrained(&location, None, None, None))
            .await
            .map_err(|e| ProviderError::Unavailable(format!("model loader panicked: {}", e)))?
            .map_err(|e| ProviderError::Unavailable(format!("Failed to load model {}: {}", model_name, e)))?;

        log::info!("Model loaded successfully in {:.2?}", start_time.elapsed());

        Ok(Self {
            model: Arc::new(model),
            model_name,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for Model2VecProvider {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || model.encode_single(&text))
            .await
            .map_err(|e| ProviderError::Unavailable(format!("embedding task failed: {}", e)))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Where a Model2Vec model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local { name: String, path: PathBuf },
    Hub { repo_id: String },
}

impl ModelSource {
    /// A directory named after the model under `models_dir` wins over the hub.
    pub fn resolve(model: &str, models_dir: &Path) -> Self {
        let candidate = Path::new(model);
        if candidate.is_absolute() && candidate.exists() {
            return ModelSource::Local {
                name: model.to_string(),
                path: candidate.to_path_buf(),
            };
        }

        let local_path = models_dir.join(model);
        if local_path.exists() {
            ModelSource::Local {
                name: model.to_string(),
                path: local_path,
            }
        } else {
            ModelSource::Hub {
                repo_id: model.to_string(),
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ModelSource::Local { name, .. } => name,
            ModelSource::Hub { repo_id } => repo_id,
        }
    }

    fn location(&self) -> PathBuf {
        match self {
            ModelSource::Local { path, .. } => path.clone(),
            ModelSource::Hub { repo_id } => PathBuf::from(repo_id),
        }
    }
}
