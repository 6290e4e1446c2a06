//! Embedding generation for semantic search and retrieval.

#[cfg(feature = "local-embeddings")]
mod local;
mod openai;

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Create the embedder selected in the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    match settings.embedding.provider {
        EmbeddingProvider::OpenAI => Ok(Arc::new(OpenAIEmbedder::from_settings(
            &settings.embedding,
        )?)),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedder::new(
            &settings.embedding.model,
            settings.data_dir().join("models"),
        )?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Local => Err(crate::error::EduError::Config(
            "The local embedding provider requires the 'local-embeddings' feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_embedder_from_settings() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::OpenAI;
        settings.embedding.model = "text-embedding-3-large".to_string();
        settings.embedding.dimensions = 1024;

        let embedder = create_embedder(&settings).unwrap();
        assert_eq!(embedder.dimensions(), 1024);
    }
}
