//! Configuration module for Recall.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{render, RagPrompts};
pub use settings::{
    EmbeddingProvider, EmbeddingSettings, GeneralSettings, LlmProvider, LlmSettings,
    PromptSettings, RagSettings, Settings, YoutubeSettings,
};
