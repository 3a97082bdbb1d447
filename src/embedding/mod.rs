//! Embedding generation for semantic search and retrieval.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceEmbedder;
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

/// Create the configured embedder.
///
/// The credential is optional here; a provider that needs one fails on
/// first use with a configuration error naming the variable.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let api_key = settings.embedding_api_key();
    Ok(match settings.embedding.provider {
        EmbeddingProvider::HuggingFace => {
            Arc::new(HuggingFaceEmbedder::new(&settings.embedding, api_key)?)
        }
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::new(&settings.embedding, api_key)?),
    })
}
