//! Local sentence embeddings via fastembed.
//!
//! The model is downloaded from Hugging Face on first use and cached under
//! the data directory; after that no network access is needed.

use super::Embedder;
use crate::error::{EduError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

const BATCH_SIZE: usize = 64;

/// Map a configured model name to a fastembed model and its dimension.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        other => Err(EduError::Config(format!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5",
            other
        ))),
    }
}

/// Embedder backed by a local ONNX sentence-transformer.
pub struct LocalEmbedder {
    // `TextEmbedding::embed` takes `&mut self`
    model: Arc<Mutex<TextEmbedding>>,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Load the named model, caching weights in `cache_dir`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let (model, dimensions) = resolve_model(model_name)?;
        std::fs::create_dir_all(&cache_dir)?;

        info!("Loading local embedding model {}", model_name);
        let embedding = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(false),
        )
        .map_err(|e| EduError::Embedding(format!("Failed to load {}: {}", model_name, e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EduError::Embedding("Empty embedding result".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.clone();
        let texts = texts.to_vec();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EduError::Embedding("Embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, Some(BATCH_SIZE))
                .map_err(|e| EduError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| EduError::Embedding(format!("Embedding task failed: {}", e)))??;

        debug!("Generated {} local embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
