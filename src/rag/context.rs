//! Context retrieval for RAG responses.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Finds the chunks of an index most relevant to a query.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed `query` and return the `k` most similar chunks, best first.
    #[instrument(skip(self, index), fields(chunks = index.len()))]
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = index.search(&query_embedding, k);

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Join chunk texts, in the given order, separated by a blank line.
pub fn format_context_for_prompt(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
