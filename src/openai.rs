//! Client construction for OpenAI-compatible APIs (OpenAI, Groq).

use crate::error::{RecallError, Result};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;

/// Create a client for an OpenAI-compatible endpoint with a request timeout.
///
/// `api_base` defaults to the OpenAI API when not given.
pub fn create_client(
    api_base: Option<&str>,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RecallError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Map a client error onto the crate error, keeping transient failures
/// (timeouts, rate limits, 5xx) retryable.
pub fn classify_error(context: &str, error: OpenAIError) -> RecallError {
    let transient = match &error {
        OpenAIError::Reqwest(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status()
                    .is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
        }
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.as_deref().unwrap_or_default();
            kind.contains("rate_limit") || kind.contains("server_error")
        }
        _ => false,
    };

    let message = format!("{}: {}", context, error);
    if transient {
        RecallError::ProviderUnavailable(message)
    } else {
        RecallError::Provider(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;

    #[test]
    fn test_create_client_with_custom_base() {
        let client = create_client(
            Some("https://api.groq.com/openai/v1/"),
            "test-key",
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_classify_error() {
        let api: ApiError =
            serde_json::from_str(r#"{"message": "slow down", "type": "rate_limit_exceeded"}"#)
                .unwrap();
        let rate_limited = OpenAIError::ApiError(api);
        assert!(classify_error("chat", rate_limited).is_transient());

        let invalid = OpenAIError::InvalidArgument("bad model".to_string());
        assert!(matches!(
            classify_error("chat", invalid),
            RecallError::Provider(msg) if msg.starts_with("chat: ")
        ));
    }
}
