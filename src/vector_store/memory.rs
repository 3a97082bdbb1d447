//! Exact nearest-neighbour index held in memory.

use super::{cosine_similarity, SearchResult};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{RecallError, Result};
use tracing::{debug, instrument};

/// Chunks paired with their embeddings, searched by brute-force cosine
/// similarity.
///
/// An index belongs to a single loaded video and is dropped with it.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Any embedding failure fails the whole build.
    #[instrument(skip(chunks, embedder), fields(chunks = chunks.len()))]
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let index = Self::from_embeddings(chunks, embeddings)?;
        debug!("Indexed {} chunks", index.len());
        Ok(index)
    }

    /// Build from precomputed embeddings, one per chunk, all the same length.
    pub fn from_embeddings(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(RecallError::Provider(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(RecallError::Provider(format!(
                "Inconsistent embedding dimensions: {} and {}",
                dimensions,
                bad.len()
            )));
        }

        Ok(Self {
            chunks,
            embeddings,
            dimensions,
        })
    }

    /// The `k` chunks most similar to `query_embedding`, best first.
    ///
    /// Equal scores keep chunk order.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, cosine_similarity(query_embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| self.chunks[a.0].index.cmp(&self.chunks[b.0].index))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Embedding length, or 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n).map(|i| Chunk::new(i, format!("chunk {}", i), i * 10)).collect()
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = VectorIndex::from_embeddings(
            chunks(3),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap();

        let results = index.search(&[0.0, 1.0], 3);
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_chunk_order() {
        let index = VectorIndex::from_embeddings(
            chunks(4),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0]],
        )
        .unwrap();

        let order: Vec<usize> = index
            .search(&[1.0, 0.0], 3)
            .iter()
            .map(|r| r.chunk.index)
            .collect();
        assert_eq!(order, vec![0, 2, 3]);
    }

    #[test]
    fn test_nan_embedding_ranks_as_unrelated() {
        let index = VectorIndex::from_embeddings(
            chunks(3),
            vec![vec![f32::NAN, 1.0], vec![1.0, 0.0], vec![-1.0, 0.0]],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0], 3);
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn test_k_larger_than_index() {
        let index =
            VectorIndex::from_embeddings(chunks(2), vec![vec![1.0], vec![0.5]]).unwrap();
        assert_eq!(index.search(&[1.0], 6).len(), 2);
        assert!(index.search(&[1.0], 0).is_empty());
    }

    #[test]
    fn test_rejects_mismatched_embeddings() {
        assert!(VectorIndex::from_embeddings(chunks(2), vec![vec![1.0]]).is_err());
        assert!(
            VectorIndex::from_embeddings(chunks(2), vec![vec![1.0], vec![1.0, 2.0]]).is_err()
        );
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RecallError::ProviderUnavailable("503".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RecallError::ProviderUnavailable("503".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_build_fails_when_embedding_fails() {
        let result = VectorIndex::build(chunks(2), &FailingEmbedder).await;
        assert!(matches!(result, Err(RecallError::ProviderUnavailable(_))));
    }
}
