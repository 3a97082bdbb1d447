//! Pipeline orchestrator for Recall.
//!
//! Owns the shared collaborators (YouTube clients, embedder, language model)
//! and runs URL → transcript → chunks → index, then retrieval and answering
//! against an index. Per-video state lives in [`LoadedVideo`], not here.

use crate::config::{RagPrompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{RecallError, Result};
use crate::chunking::TextSplitter;
use crate::llm::{create_language_model, LanguageModel};
use crate::rag::{AnswerSynthesizer, RagEngine, RagResponse, Retriever};
use crate::transcript::{TranscriptAcquirer, TranscriptResult, TranscriptSource};
use crate::vector_store::{SearchResult, VectorIndex};
use crate::youtube::{TimedTextClient, VideoId, YoutubeDataApi};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A video whose transcript has been acquired and indexed.
#[derive(Debug, Clone)]
pub struct LoadedVideo {
    pub video_id: VideoId,
    pub url: String,
    pub source: TranscriptSource,
    /// Caveat attached to the transcript, e.g. when only metadata was found.
    pub diagnostic: Option<String>,
    pub transcript_chars: usize,
    pub index: VectorIndex,
}

impl LoadedVideo {
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

/// The main orchestrator for the Recall pipeline.
pub struct Orchestrator {
    settings: Settings,
    acquirer: TranscriptAcquirer,
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
    engine: RagEngine,
}

impl Orchestrator {
    /// Create an orchestrator with the clients named in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let data_api = Arc::new(YoutubeDataApi::new(
            &settings.youtube,
            settings.youtube_api_key(),
        )?);
        let timedtext = Arc::new(TimedTextClient::new(&settings.youtube)?);

        let acquirer = TranscriptAcquirer::new(data_api.clone(), timedtext, data_api)
            .with_caption_prefix(&settings.youtube.preferred_caption_prefix)
            .with_languages(settings.youtube.preferred_languages.clone());

        let embedder = create_embedder(&settings)?;
        let model = create_language_model(&settings)?;

        info!(
            "Using {} embeddings ({}) and {} ({})",
            settings.embedding.provider,
            settings.embedding.model,
            settings.llm.provider,
            settings.llm.model
        );

        Self::with_components(settings, acquirer, embedder, model)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        acquirer: TranscriptAcquirer,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = RagPrompts::load(
            settings.prompts.custom_dir.as_deref(),
            &settings.prompts.variables,
        )?;
        let splitter = TextSplitter::new(settings.chunking)?;

        let synthesizer = AnswerSynthesizer::new(model)
            .with_prompts(prompts)
            .with_temperature(settings.llm.temperature);
        let engine = RagEngine::new(Retriever::new(embedder.clone()), synthesizer)
            .with_top_k(settings.rag.top_k);

        Ok(Self {
            settings,
            acquirer,
            splitter,
            embedder,
            engine,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &RagEngine {
        &self.engine
    }

    /// Run the transcript fallback chain for a video.
    pub async fn acquire_transcript(&self, video_id: &VideoId) -> TranscriptResult {
        self.acquirer.acquire(video_id.as_str()).await
    }

    /// Chunk `text` and embed every chunk.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn build_index(&self, text: &str) -> Result<VectorIndex> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            return Err(RecallError::TranscriptUnavailable(
                "The transcript is empty.".to_string(),
            ));
        }

        info!("Embedding {} chunks", chunks.len());
        VectorIndex::build(chunks, self.embedder.as_ref()).await
    }

    /// Parse `url`, acquire its transcript and index it.
    #[instrument(skip(self))]
    pub async fn prepare(&self, url: &str) -> Result<LoadedVideo> {
        let video_id = VideoId::from_url(url)?;
        info!("Loading video {}", video_id);

        let (text, source, diagnostic) = self.acquire_transcript(&video_id).await.into_parts()?;
        if let Some(note) = &diagnostic {
            warn!("{}", note);
        }

        let index = self.build_index(&text).await?;
        info!("Indexed {} chunks from {}", index.len(), source);

        Ok(LoadedVideo {
            video_id,
            url: url.trim().to_string(),
            source,
            diagnostic,
            transcript_chars: text.chars().count(),
            index,
        })
    }

    /// Answer a question about a loaded video. `k` defaults to `rag.top_k`.
    pub async fn ask(
        &self,
        video: &LoadedVideo,
        question: &str,
        k: Option<usize>,
    ) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RecallError::InvalidInput("The question is empty.".to_string()));
        }

        let k = k.unwrap_or(self.engine.top_k());
        self.engine.ask_with_top_k(&video.index, question, k).await
    }

    /// Retrieve the chunks most similar to `query` without answering.
    pub async fn search(
        &self,
        video: &LoadedVideo,
        query: &str,
        k: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let k = k.unwrap_or(self.engine.top_k());
        self.engine.retriever().retrieve(&video.index, query, k).await
    }
}
