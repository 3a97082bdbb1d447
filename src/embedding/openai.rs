//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{RecallError, Result};
use crate::openai::{classify_error, create_client};
use crate::retry::RetryPolicy;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    dimensions: usize,
    batch_size: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    pub fn new(settings: &EmbeddingSettings, api_key: Option<String>) -> Result<Self> {
        let client = api_key
            .map(|key| {
                create_client(
                    settings.api_base.as_deref(),
                    &key,
                    Duration::from_secs(settings.timeout_secs),
                )
            })
            .transpose()?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            retry: RetryPolicy::default().with_max_retries(settings.max_retries),
        })
    }

    fn client(&self) -> Result<&Client<OpenAIConfig>> {
        self.client.as_ref().ok_or_else(|| {
            RecallError::Config(
                "OPENAI_API_KEY is not set. Add it to your config file or environment variables."
                    .to_string(),
            )
        })
    }

    async fn embed_chunk(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let client = self.client()?;

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| RecallError::Provider(format!("Failed to build request: {}", e)))?;
        let request = &request;

        let response = self
            .retry
            .run("embedding request", move || async move {
                client
                    .embeddings()
                    .create(request.clone())
                    .await
                    .map_err(|e| classify_error("Embedding API error", e))
            })
            .await?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RecallError::Provider("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_chunk(chunk).await?;
            if embeddings.len() != chunk.len() {
                return Err(RecallError::Provider(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }
            all_embeddings.extend(embeddings);
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

    fn settings() -> EmbeddingSettings {
        EmbeddingSettings {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAIEmbedder::new(&settings(), Some("sk-test".to_string())).unwrap();
        assert_eq!(embedder.dimensions(), 1536);
    }

    #[tokio::test]
    async fn test_missing_key_fails_on_use() {
        let embedder = OpenAIEmbedder::new(&settings(), None).unwrap();

        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, RecallError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }
}
