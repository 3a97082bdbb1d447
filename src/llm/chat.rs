//! OpenAI-compatible chat completions (Groq, OpenAI).

use super::LanguageModel;
use crate::config::LlmSettings;
use crate::error::{RecallError, Result};
use crate::openai::{classify_error, create_client};
use crate::retry::RetryPolicy;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat-completion model that sends the prompt as a single user message.
pub struct ChatModel {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    api_key_env: &'static str,
    retry: RetryPolicy,
}

impl ChatModel {
    pub fn new(
        settings: &LlmSettings,
        api_base: Option<&str>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = api_key
            .map(|key| {
                create_client(api_base, &key, Duration::from_secs(settings.timeout_secs))
            })
            .transpose()?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            api_key_env: settings.provider.api_key_env(),
            retry: RetryPolicy::default().with_max_retries(settings.max_retries),
        })
    }

    fn client(&self) -> Result<&Client<OpenAIConfig>> {
        self.client.as_ref().ok_or_else(|| {
            RecallError::Config(format!(
                "{} is not set. Add it to your config file or environment variables.",
                self.api_key_env
            ))
        })
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let client = self.client()?;

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| RecallError::Provider(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(temperature)
            .build()
            .map_err(|e| RecallError::Provider(e.to_string()))?;
        let request = &request;

        let response = self
            .retry
            .run("chat completion", move || async move {
                client
                    .chat()
                    .create(request.clone())
                    .await
                    .map_err(|e| classify_error("Failed to generate response", e))
            })
            .await?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| RecallError::Provider("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;

    #[tokio::test]
    async fn test_missing_key_names_the_variable() {
        let model = ChatModel::new(&LlmSettings::default(), None, None).unwrap();
        assert_eq!(model.model_name(), "llama-3.1-8b-instant");

        let err = model.complete("hi", 0.3).await.unwrap_err();
        assert!(matches!(err, RecallError::Config(msg) if msg.starts_with("GROQ_API_KEY")));
    }

    #[test]
    fn test_openai_provider_key_variable() {
        let settings = LlmSettings {
            provider: LlmProvider::OpenAI,
            ..LlmSettings::default()
        };
        let model = ChatModel::new(&settings, None, Some("sk-test".to_string())).unwrap();
        assert_eq!(model.api_key_env, "OPENAI_API_KEY");
        assert!(model.client.is_some());
    }
}
