//! Hugging Face Inference API embeddings (feature-extraction pipeline).

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{RecallError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "https://router.huggingface.co/hf-inference/models";
const API_KEY_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";

/// Requests kept in flight while embedding many batches.
const CONCURRENT_REQUESTS: usize = 4;

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Sentence models return one vector per input; token-level models return
/// one vector per token, which is mean-pooled here.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            FeatureExtractionResponse::Pooled(vectors) => vectors,
            FeatureExtractionResponse::PerToken(tokens) => {
                tokens.into_iter().map(|t| mean_pool(&t)).collect()
            }
        }
    }
}

fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = tokens.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f32; first.len()];
    for token in tokens {
        for (s, v) in sum.iter_mut().zip(token) {
            *s += v;
        }
    }
    let n = tokens.len() as f32;
    sum.into_iter().map(|s| s / n).collect()
}

/// Embedder backed by the Hugging Face Inference API.
pub struct HuggingFaceEmbedder {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    dimensions: usize,
    batch_size: usize,
    retry: RetryPolicy,
}

impl HuggingFaceEmbedder {
    pub fn new(settings: &EmbeddingSettings, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RecallError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base = settings.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);

        Ok(Self {
            http,
            endpoint: Self::endpoint(base, &settings.model),
            api_key,
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            retry: RetryPolicy::default().with_max_retries(settings.max_retries),
        })
    }

    /// Point the embedder at a different API root (used against mock servers).
    pub fn with_base_url(base_url: &str, model: &str, dimensions: usize, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: Self::endpoint(base_url, model),
            api_key: Some(api_key.to_string()),
            dimensions,
            batch_size: EmbeddingSettings::default().batch_size,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn endpoint(base: &str, model: &str) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            base.trim_end_matches('/'),
            model
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                RecallError::Config(format!(
                    "{} is not set. Add it to your config file or environment variables.",
                    API_KEY_ENV
                ))
            })
    }

    async fn request(&self, api_key: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&FeatureExtractionRequest {
                inputs,
                options: RequestOptions {
                    wait_for_model: true,
                },
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    RecallError::ProviderUnavailable(format!("Embedding request failed: {}", e))
                } else {
                    RecallError::Provider(format!("Embedding request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Embedding API returned {}: {}", status, body.trim());
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                RecallError::ProviderUnavailable(message)
            } else {
                RecallError::Provider(message)
            });
        }

        let parsed: FeatureExtractionResponse = response.json().await.map_err(|e| {
            RecallError::Provider(format!("Unexpected embedding response: {}", e))
        })?;
        Ok(parsed.into_vectors())
    }

    async fn embed_chunk(&self, api_key: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self
            .retry
            .run("embedding request", move || self.request(api_key, inputs))
            .await?;

        if vectors.len() != inputs.len() {
            return Err(RecallError::Provider(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(RecallError::Provider(format!(
                "Expected {}-dimensional embeddings, got {}",
                self.dimensions,
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
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
        let api_key = self.api_key()?;

        debug!("Generating embeddings for {} texts", texts.len());

        // Futures are built up front so the stream holds no closure.
        // `buffered` keeps batch order while overlapping requests.
        let requests: Vec<_> = texts
            .chunks(self.batch_size)
            .map(|chunk| self.embed_chunk(api_key, chunk))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(CONCURRENT_REQUESTS)
            .try_collect()
            .await?;

        let all_embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
