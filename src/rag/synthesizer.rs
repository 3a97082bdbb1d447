//! Grounded answer generation.

use super::context::format_context_for_prompt;
use crate::chunking::Chunk;
use crate::config::RagPrompts;
use crate::error::Result;
use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{info, instrument};

/// Fills the answer template with retrieved context and asks the model.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    prompts: RagPrompts,
    temperature: f32,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: RagPrompts::default(),
            temperature: 0.3,
        }
    }

    pub fn with_prompts(mut self, prompts: RagPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build_prompt(&self, chunks: &[Chunk], question: &str) -> String {
        self.prompts
            .render_answer(&format_context_for_prompt(chunks), question)
    }

    /// Answer `question` from `chunks`, returning the model's raw text.
    ///
    /// An empty context is still sent; the template tells the model to
    /// abstain. Model failures propagate unchanged.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn answer(&self, chunks: &[Chunk], question: &str) -> Result<String> {
        let prompt = self.build_prompt(chunks, question);
        info!("Asking {}", self.model.model_name());
        self.model.complete(&prompt, self.temperature).await
    }
}
