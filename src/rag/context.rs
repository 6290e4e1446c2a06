//! Context retrieval for chat prompts.

use super::{ContextChunk, KnowledgeBase};
use crate::embedding::Embedder;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the documents nearest to a query.
pub struct ContextBuilder {
    knowledge: Arc<KnowledgeBase>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(knowledge: Arc<KnowledgeBase>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            knowledge,
            embedder,
            max_chunks: 10,
        }
    }

    /// Set the maximum number of context documents.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Retrieve context for a query, nearest first.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let k = self.max_chunks.min(self.knowledge.document_count());
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.knowledge.search(&query_embedding, k)?;
        debug!("Retrieved {} documents for query", hits.len());

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let content = self.knowledge.document(hit.index)?;
                let meta = self.knowledge.metadata(hit.index)?;
                Some(ContextChunk {
                    index: hit.index,
                    content: content.to_string(),
                    meta: meta.clone(),
                    distance: hit.distance,
                })
            })
            .collect())
    }
}

/// Join retrieved documents for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
