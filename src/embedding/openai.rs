//! Embeddings from an OpenAI-compatible endpoint.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{EduError, Result};
use crate::openai::create_client_with;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// Embedder backed by a remote embeddings API.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    pub fn new(client: Client<OpenAIConfig>, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }

    /// Build from `[embedding]` settings.
    ///
    /// A custom `api_base` needs its key in `api_key_env`; without one the
    /// OpenAI default endpoint reads `OPENAI_API_KEY`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key();
        if api_key.is_none() && settings.api_base.is_some() {
            return Err(EduError::Config(format!(
                "No API key found in {}",
                settings.api_key_env
            )));
        }

        let client = create_client_with(
            settings.api_base.as_deref(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::new(
            client,
            &settings.model,
            settings.dimensions as usize,
        ))
    }
}

/// Put one batch's vectors back in request order and check their shape.
fn ordered_vectors(
    mut data: Vec<(u32, Vec<f32>)>,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(EduError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|(index, _)| *index);
    data.into_iter()
        .map(|(index, vector)| {
            if vector.len() == dimensions {
                Ok(vector)
            } else {
                Err(EduError::Embedding(format!(
                    "Embedding {} has {} dimensions, configured for {}",
                    index,
                    vector.len(),
                    dimensions
                )))
            }
        })
        .collect()
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EduError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| EduError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| EduError::OpenAI(format!("Embedding API error: {}", e)))?;

            let data = response
                .data
                .into_iter()
                .map(|e| (e.index, e.embedding))
                .collect();
            all_embeddings.extend(ordered_vectors(data, chunk.len(), self.dimensions)?);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_uses_configured_dimensions() {
        let settings = EmbeddingSettings {
            model: "text-embedding-3-small".to_string(),
            dimensions: 512,
            ..EmbeddingSettings::default()
        };
        let embedder = OpenAIEmbedder::from_settings(&settings).unwrap();
        assert_eq!(embedder.dimensions(), 512);
        assert_eq!(embedder.model, "text-embedding-3-small");
    }

    #[test]
    fn test_custom_endpoint_requires_key() {
        let settings = EmbeddingSettings {
            api_base: Some("http://localhost:11434/v1".to_string()),
            api_key_env: "EDUAI_TEST_UNSET_EMBEDDING_KEY".to_string(),
            ..EmbeddingSettings::default()
        };
        let err = OpenAIEmbedder::from_settings(&settings).err().unwrap();
        assert!(matches!(err, EduError::Config(_)));
        assert!(err.to_string().contains("EDUAI_TEST_UNSET_EMBEDDING_KEY"));
    }

    #[test]
    fn test_vectors_are_returned_in_request_order() {
        let data = vec![(2, vec![2.0, 2.0]), (0, vec![0.0, 0.0]), (1, vec![1.0, 1.0])];
        let vectors = ordered_vectors(data, 3, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]]);
    }

    #[test]
    fn test_wrong_dimensions_are_rejected() {
        let data = vec![(0, vec![0.0; 384]), (1, vec![0.0; 1536])];
        let err = ordered_vectors(data, 2, 384).unwrap_err();
        assert!(matches!(err, EduError::Embedding(_)));
        assert!(err.to_string().contains("1536"));
    }

    #[test]
    fn test_missing_vectors_are_rejected() {
        let data = vec![(0, vec![0.0; 4])];
        assert!(matches!(ordered_vectors(data, 2, 4), Err(EduError::Embedding(_))));
    }
}
