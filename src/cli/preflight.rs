//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{RecallError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript needs the YouTube Data API key.
    Transcript,
    /// Searching also embeds chunks and queries.
    Search,
    /// Asking also calls the language model.
    Ask,
}

/// A credential an operation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub env_var: &'static str,
    pub purpose: &'static str,
    pub present: bool,
}

/// Credentials needed by `operation`, with whether each is configured.
pub fn requirements(operation: Operation, settings: &Settings) -> Vec<Requirement> {
    let youtube = Requirement {
        env_var: "YOUTUBE_API_KEY",
        purpose: "YouTube Data API",
        present: settings.youtube_api_key().is_some(),
    };
    let embedding = Requirement {
        env_var: settings.embedding.provider.api_key_env(),
        purpose: "embeddings",
        present: settings.embedding_api_key().is_some(),
    };
    let llm = Requirement {
        env_var: settings.llm.provider.api_key_env(),
        purpose: "language model",
        present: settings.llm_api_key().is_some(),
    };

    match operation {
        Operation::Transcript => vec![youtube],
        Operation::Search => vec![youtube, embedding],
        Operation::Ask => vec![youtube, embedding, llm],
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error naming the first missing
/// credential and how to set it.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match requirements(operation, settings)
        .into_iter()
        .find(|r| !r.present)
    {
        Some(missing) => Err(RecallError::Config(format!(
            "{} not set (needed for {}). Set it with: export {}='...'",
            missing.env_var, missing.purpose, missing.env_var
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("yt".to_string());
        settings.embedding.api_key = Some("hf".to_string());
        settings.llm.api_key = Some("groq".to_string());
        settings
    }

    #[test]
    fn test_all_credentials_present() {
        let settings = configured();
        assert!(check(Operation::Transcript, &settings).is_ok());
        assert!(check(Operation::Search, &settings).is_ok());
        assert!(check(Operation::Ask, &settings).is_ok());
    }

    #[test]
    fn test_requirements_per_operation() {
        let settings = configured();
        assert_eq!(requirements(Operation::Transcript, &settings).len(), 1);
        assert_eq!(requirements(Operation::Search, &settings).len(), 2);

        let ask = requirements(Operation::Ask, &settings);
        assert_eq!(ask[1].env_var, "HUGGINGFACEHUB_API_TOKEN");
        assert_eq!(ask[2].env_var, "GROQ_API_KEY");
    }
}
