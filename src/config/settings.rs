//! Configuration settings for Recall.

use crate::chunking::ChunkingConfig;
use crate::error::{RecallError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub chunking: ChunkingConfig,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// YouTube endpoints and transcript language preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `YOUTUBE_API_KEY`.
    pub api_key: Option<String>,
    pub api_base: String,
    pub watch_base: String,
    /// Caption tracks whose language starts with this are downloaded first.
    pub preferred_caption_prefix: String,
    /// Transcript languages to request, in order.
    pub preferred_languages: Vec<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            watch_base: "https://www.youtube.com".to_string(),
            preferred_caption_prefix: "en".to_string(),
            preferred_languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face Inference API (sentence-transformers models).
    #[default]
    HuggingFace,
    OpenAI,
}

impl EmbeddingProvider {
    /// Environment variable holding this provider's credential.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            EmbeddingProvider::HuggingFace => "HUGGINGFACEHUB_API_TOKEN",
            EmbeddingProvider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(EmbeddingProvider::HuggingFace),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::HuggingFace => write!(f, "huggingface"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimensions: usize,
    /// Override for the provider's API root.
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    /// Texts sent per embedding request.
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            api_base: None,
            api_key: None,
            batch_size: 32,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

/// Language model provider type. Both speak the OpenAI chat protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    OpenAI,
}

impl LlmProvider {
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// API root used when `llm.api_base` is not set. `None` means the
    /// client library default.
    pub fn default_api_base(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Groq => Some("https://api.groq.com/openai/v1"),
            LlmProvider::OpenAI => None,
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "openai" => Ok(LlmProvider::OpenAI),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Hosted language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Completions are not retried unless this is raised.
    pub max_retries: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            api_base: None,
            api_key: None,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self { top_k: 6 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory holding a `rag.toml` that overrides the answer template.
    pub custom_dir: Option<String>,
    /// Extra variables available in the template as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

/// Config value if set and non-empty, otherwise the environment variable.
fn resolve_credential(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// A missing file yields defaults. The result is validated.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.rag.top_k == 0 {
            return Err(RecallError::Config("rag.top_k must be at least 1".to_string()));
        }
        if self.embedding.batch_size == 0 {
            return Err(RecallError::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RecallError::Config(e.to_string()))
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recall")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    pub fn youtube_api_key(&self) -> Option<String> {
        resolve_credential(self.youtube.api_key.as_deref(), "YOUTUBE_API_KEY")
    }

    pub fn embedding_api_key(&self) -> Option<String> {
        resolve_credential(
            self.embedding.api_key.as_deref(),
            self.embedding.provider.api_key_env(),
        )
    }

    pub fn llm_api_key(&self) -> Option<String> {
        resolve_credential(self.llm.api_key.as_deref(), self.llm.provider.api_key_env())
    }

    /// API root for the language model, honouring an explicit override.
    pub fn llm_api_base(&self) -> Option<String> {
        self.llm
            .api_base
            .clone()
            .or_else(|| self.llm.provider.default_api_base().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.provider, EmbeddingProvider::HuggingFace);
        assert_eq!(settings.embedding.dimensions, 384);
        assert_eq!(settings.llm.provider, LlmProvider::Groq);
        assert_eq!(settings.llm.max_retries, 0);
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.rag.top_k, 6);
        assert_eq!(
            settings.llm_api_base().as_deref(),
            Some("https://api.groq.com/openai/v1")
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n\n[rag]\ntop_k = 3\n",
        )
        .unwrap();

        let settings = Settings::load_from(Some(path.as_path())).unwrap();
        assert_eq!(settings.llm.provider, LlmProvider::OpenAI);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.temperature, 0.3);
        assert!(settings.llm_api_base().is_none());
        assert_eq!(settings.rag.top_k, 3);
        assert_eq!(settings.youtube.preferred_caption_prefix, "en");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(settings.rag.top_k, 6);
    }

    #[test]
    fn test_invalid_chunking_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();

        assert!(matches!(
            Settings::load_from(Some(path.as_path())),
            Err(RecallError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.youtube.preferred_languages = vec!["de".to_string()];
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(path.as_path())).unwrap();
        assert_eq!(loaded.youtube.preferred_languages, vec!["de".to_string()]);
    }

    #[test]
    fn test_configured_credential_wins() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("from-config".to_string());
        assert_eq!(settings.youtube_api_key().as_deref(), Some("from-config"));

        assert_eq!(
            resolve_credential(Some("  "), "RECALL_TEST_UNSET_VARIABLE"),
            None
        );
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("HF".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::HuggingFace));
        assert_eq!("groq".parse::<LlmProvider>(), Ok(LlmProvider::Groq));
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }
}
