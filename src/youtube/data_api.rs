//! YouTube Data API v3 client.
//!
//! Covers the three calls the acquirer needs: `captions.list`,
//! `captions.download` and `videos.list`. Caption downloads require OAuth
//! for videos the caller does not own, so they usually come back 401/403.

use super::{
    check_response, CaptionFormat, CaptionService, CaptionTrack, MetadataService, ServiceError,
    VideoMetadata,
};
use crate::config::YoutubeSettings;
use crate::error::{RecallError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Client for the YouTube Data API, keyed by an API key.
pub struct YoutubeDataApi {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl YoutubeDataApi {
    /// Create a client from settings.
    pub fn new(settings: &YoutubeSettings, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RecallError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default().with_max_retries(settings.max_retries),
        })
    }

    /// Point the client at a different API root (used against mock servers).
    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::none(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn api_key(&self) -> std::result::Result<&str, ServiceError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ServiceError::MissingCredential(API_KEY_ENV))
    }

    /// GET `{api_base}/{path}` with the API key attached, retrying transient failures.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<reqwest::Response, ServiceError> {
        let key = self.api_key()?;
        let url = format!("{}/{}", self.api_base, path);
        let http = &self.http;
        let url = &url;

        self.retry
            .run(path, move || async move {
                let response = http
                    .get(url)
                    .query(query)
                    .query(&[("key", key)])
                    .send()
                    .await?;
                check_response(response).await
            })
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    #[serde(default)]
    snippet: CaptionSnippet,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionSnippet {
    #[serde(default)]
    language: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    snippet: VideoSnippet,
}

#[derive(Debug, Default, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, ServiceError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[async_trait]
impl CaptionService for YoutubeDataApi {
    #[instrument(skip(self))]
    async fn list_captions(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<CaptionTrack>, ServiceError> {
        let response = self
            .get("captions", &[("part", "snippet"), ("videoId", video_id)])
            .await?;
        let list: ListResponse<CaptionItem> = decode(response).await?;

        debug!("Video has {} caption tracks", list.items.len());

        Ok(list
            .items
            .into_iter()
            .map(|item| CaptionTrack {
                id: item.id,
                language: item.snippet.language,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn download_caption(
        &self,
        caption_id: &str,
        format: CaptionFormat,
    ) -> std::result::Result<Vec<u8>, ServiceError> {
        let path = format!("captions/{}", caption_id);
        let response = self.get(&path, &[("tfmt", format.as_param())]).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MetadataService for YoutubeDataApi {
    #[instrument(skip(self))]
    async fn get_video(
        &self,
        video_id: &str,
    ) -> std::result::Result<Option<VideoMetadata>, ServiceError> {
        let response = self
            .get("videos", &[("part", "snippet"), ("id", video_id)])
            .await?;
        let list: ListResponse<VideoItem> = decode(response).await?;

        Ok(list.items.into_iter().next().map(|item| VideoMetadata {
            title: item.snippet.title,
            description: item.snippet.description,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_reported_before_any_request() {
        let api = YoutubeDataApi::with_base_url("http://127.0.0.1:9", None);
        assert!(!api.has_api_key());

        let err = api.list_captions("abc123").await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingCredential("YOUTUBE_API_KEY")));
    }

    #[test]
    fn test_decode_caption_list_shape() {
        let json = r#"{"items": [
            {"id": "cap-1", "snippet": {"language": "de"}},
            {"id": "cap-2", "snippet": {"language": "en-GB", "trackKind": "standard"}}
        ]}"#;
        let list: ListResponse<CaptionItem> = serde_json::from_str(json).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].snippet.language, "en-GB");

        let empty: ListResponse<VideoItem> = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(empty.items.is_empty());
    }
}
