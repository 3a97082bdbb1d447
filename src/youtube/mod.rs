//! YouTube collaborators: URL parsing and the services transcripts come from.
//!
//! The transcript acquirer only talks to the traits defined here, so each
//! service can be swapped for a fake in tests.

mod data_api;
mod timedtext;

pub use data_api::YoutubeDataApi;
pub use timedtext::TimedTextClient;

use crate::error::{RecallError, Result};
use crate::retry::Transient;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Extract the video identifier from a YouTube URL.
///
/// Watch-page URLs yield their `v` query parameter and short links yield the
/// path after the leading slash. Any other host yields `None`.
pub fn extract_video_id(input: &str) -> Option<String> {
    let parsed = url::Url::parse(input.trim()).ok()?;
    let host = parsed.host_str()?;

    if host.contains("youtube.com") {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|v| !v.is_empty());
    }

    if host.contains("youtu.be") {
        let id = parsed.path().strip_prefix('/').unwrap_or(parsed.path());
        return (!id.is_empty()).then(|| id.to_string());
    }

    None
}

fn id_syntax() -> &'static Regex {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"))
}

/// A validated YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a video URL into a validated identifier.
    pub fn from_url(url: &str) -> Result<Self> {
        let id = extract_video_id(url).ok_or_else(|| {
            RecallError::InvalidInput(format!("Not a recognised YouTube URL: {}", url))
        })?;
        Self::new(id)
    }

    /// Wrap a raw identifier, checking YouTube's identifier alphabet.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if !id_syntax().is_match(&id) {
            return Err(RecallError::InvalidInput(format!(
                "Invalid YouTube video ID: '{}'",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch-page URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by a YouTube collaborator.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 401/403. Caption downloads need OAuth, so this is expected.
    #[error("request not authorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ServiceError::Unauthorized { status },
            404 => ServiceError::NotFound(message),
            _ => ServiceError::Status { status, message },
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, ServiceError::Unauthorized { .. })
    }

    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl Transient for ServiceError {
    fn is_transient(&self) -> bool {
        ServiceError::is_transient(self)
    }
}

/// Turn a non-success response into a [`ServiceError`], keeping the
/// API's own error message when it sends one.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    Err(ServiceError::from_status(status.as_u16(), message))
}

/// A caption track listed for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub id: String,
    /// BCP-47 language code, e.g. `en-US`.
    pub language: String,
}

/// Subtitle formats accepted by caption downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Srt,
}

impl CaptionFormat {
    pub fn as_param(&self) -> &'static str {
        match self {
            CaptionFormat::Srt => "srt",
        }
    }
}

/// One timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// A transcript available for a video, not yet fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptHandle {
    pub language_code: String,
    /// Human-readable language name.
    pub language: String,
    /// Auto-generated (speech recognition) rather than uploaded.
    pub is_generated: bool,
    pub base_url: String,
}

/// Title and description of a video.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

/// Official caption tracks.
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// List the caption tracks of a video, in the order the API returns them.
    async fn list_captions(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<CaptionTrack>, ServiceError>;

    /// Download one caption track.
    async fn download_caption(
        &self,
        caption_id: &str,
        format: CaptionFormat,
    ) -> std::result::Result<Vec<u8>, ServiceError>;
}

/// Publicly served transcript segments.
#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Fetch the first transcript matching `languages`, tried in order.
    async fn get_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Vec<TranscriptSegment>, ServiceError>;

    /// List every transcript the video offers.
    async fn list_transcripts(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<TranscriptHandle>, ServiceError>;

    /// Fetch the segments behind a listed transcript.
    async fn fetch(
        &self,
        handle: &TranscriptHandle,
    ) -> std::result::Result<Vec<TranscriptSegment>, ServiceError>;
}

/// Video metadata lookups.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// `Ok(None)` when the API knows nothing about the video.
    async fn get_video(
        &self,
        video_id: &str,
    ) -> std::result::Result<Option<VideoMetadata>, ServiceError>;
}
