//! Hosted language models used for answer synthesis.

mod chat;

pub use chat::ChatModel;

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A text-completion model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt and return the model's raw text.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Model identifier, for display.
    fn model_name(&self) -> &str;
}

/// Create the configured language model.
///
/// A missing credential surfaces as a configuration error on first use.
pub fn create_language_model(settings: &Settings) -> Result<Arc<dyn LanguageModel>> {
    Ok(Arc::new(ChatModel::new(
        &settings.llm,
        settings.llm_api_base().as_deref(),
        settings.llm_api_key(),
    )?))
}
