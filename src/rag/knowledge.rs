//! The searchable document set: flattened documents plus their index.

use crate::documents::{Corpus, DocumentMeta};
use crate::embedding::Embedder;
use crate::error::{EduError, Result};
use crate::vector_store::{FlatIndex, Neighbor, VectorIndex};
use tracing::{info, instrument, warn};

/// Documents and a vector index whose positions line up one to one.
///
/// Built once; there is no way to add or remove documents afterwards.
pub struct KnowledgeBase {
    corpus: Corpus,
    index: Box<dyn VectorIndex>,
}

impl KnowledgeBase {
    /// Embed every document and build a flat index over them.
    #[instrument(skip_all, fields(documents = corpus.len()))]
    pub async fn build(corpus: Corpus, embedder: &dyn Embedder) -> Result<Self> {
        if corpus.is_empty() {
            warn!("Building a knowledge base with no documents");
        }

        let vectors = embedder.embed_batch(&corpus.documents).await?;
        if vectors.len() != corpus.len() {
            return Err(EduError::Embedding(format!(
                "Embedder returned {} vectors for {} documents",
                vectors.len(),
                corpus.len()
            )));
        }

        let dimensions = vectors
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| embedder.dimensions());
        let mut index = FlatIndex::new(dimensions);
        index.add(&vectors)?;

        info!("Indexed {} documents ({} dimensions)", index.len(), dimensions);
        Self::from_parts(corpus, Box::new(index))
    }

    /// Pair a corpus with an already populated index.
    pub fn from_parts(corpus: Corpus, index: Box<dyn VectorIndex>) -> Result<Self> {
        if index.len() != corpus.len() {
            return Err(EduError::VectorStore(format!(
                "Index holds {} vectors but there are {} documents",
                index.len(),
                corpus.len()
            )));
        }
        Ok(Self { corpus, index })
    }

    pub fn document_count(&self) -> usize {
        self.corpus.len()
    }

    pub fn index_size(&self) -> usize {
        self.index.len()
    }

    pub fn document(&self, i: usize) -> Option<&str> {
        self.corpus.documents.get(i).map(String::as_str)
    }

    pub fn metadata(&self, i: usize) -> Option<&DocumentMeta> {
        self.corpus.metadata.get(i)
    }

    /// Nearest documents to a query vector.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.search(query, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::flatten;
    use crate::rag::testing::{sample_dataset, KeywordEmbedder};

    #[tokio::test]
    async fn test_build_aligns_documents_and_vectors() {
        let embedder = KeywordEmbedder;
        let corpus = flatten(&sample_dataset(), chrono_tz::UTC);
        let count = corpus.len();

        let kb = KnowledgeBase::build(corpus, &embedder).await.unwrap();
        assert_eq!(kb.document_count(), count);
        assert_eq!(kb.index_size(), count);

        // Every document is its own nearest neighbor
        for i in 0..count {
            let query = embedder.embed(kb.document(i).unwrap()).await.unwrap();
            let hits = kb.search(&query, 1).unwrap();
            assert_eq!(hits[0].index, i);
            assert!(hits[0].distance.abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_empty_corpus_builds() {
        let kb = KnowledgeBase::build(Corpus::default(), &KeywordEmbedder)
            .await
            .unwrap();
        assert_eq!(kb.document_count(), 0);
        assert_eq!(kb.index_size(), 0);
        assert!(kb.document(0).is_none());
    }

    #[test]
    fn test_from_parts_rejects_misaligned_index() {
        let corpus = flatten(&sample_dataset(), chrono_tz::UTC);
        let mut index = FlatIndex::new(2);
        index.add(&[vec![0.0, 1.0]]).unwrap();

        let result = KnowledgeBase::from_parts(corpus, Box::new(index));
        assert!(matches!(result, Err(EduError::VectorStore(_))));
    }
}
