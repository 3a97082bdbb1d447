//! Transcript segments served publicly by YouTube's player.
//!
//! The watch page embeds a `captionTracks` list whose entries point at
//! timedtext XML documents. No API key or OAuth is needed.

use super::{check_response, ServiceError, TranscriptHandle, TranscriptSegment, TranscriptService};
use crate::config::YoutubeSettings;
use crate::error::{RecallError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument};

const CAPTION_TRACKS_KEY: &str = "\"captionTracks\":";

/// Client for the watch-page transcript listing and timedtext documents.
pub struct TimedTextClient {
    http: reqwest::Client,
    watch_base: String,
    retry: RetryPolicy,
}

impl TimedTextClient {
    pub fn new(settings: &YoutubeSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RecallError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            watch_base: settings.watch_base.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default().with_max_retries(settings.max_retries),
        })
    }

    /// Point the client at a different site root (used against mock servers).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            watch_base: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::none(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<String, ServiceError> {
        let http = &self.http;
        self.retry
            .run(url, move || fetch_text(http, url, query))
            .await
    }

    fn absolute_url(&self, base_url: &str) -> String {
        if base_url.starts_with('/') {
            format!("{}{}", self.watch_base, base_url)
        } else {
            base_url.to_string()
        }
    }
}

async fn fetch_text(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> std::result::Result<String, ServiceError> {
    let response = http
        .get(url)
        .query(query)
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
        .send()
        .await?;
    Ok(check_response(response).await?.text().await?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: serde_json::Value,
}

impl From<RawCaptionTrack> for TranscriptHandle {
    fn from(raw: RawCaptionTrack) -> Self {
        let language = raw.name["simpleText"]
            .as_str()
            .or_else(|| raw.name["runs"][0]["text"].as_str())
            .unwrap_or(raw.language_code.as_str())
            .to_string();

        TranscriptHandle {
            is_generated: raw.kind.as_deref() == Some("asr"),
            language_code: raw.language_code,
            language,
            base_url: raw.base_url.replace("&fmt=srv3", ""),
        }
    }
}

/// Pull the caption track list out of a watch page.
///
/// Returns an empty list when the page has no captions section.
pub(crate) fn parse_caption_tracks(
    html: &str,
) -> std::result::Result<Vec<TranscriptHandle>, ServiceError> {
    let Some(start) = html.find(CAPTION_TRACKS_KEY) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(ServiceError::Status {
                status: 429,
                message: "YouTube is asking for a captcha".to_string(),
            });
        }
        return Ok(Vec::new());
    };

    let json = &html[start + CAPTION_TRACKS_KEY.len()..];
    let tracks = serde_json::Deserializer::from_str(json)
        .into_iter::<Vec<RawCaptionTrack>>()
        .next()
        .ok_or_else(|| ServiceError::Decode("empty captionTracks".to_string()))?
        .map_err(|e| ServiceError::Decode(format!("captionTracks: {}", e)))?;

    Ok(tracks.into_iter().map(TranscriptHandle::from).collect())
}

fn text_element() -> &'static Regex {
    static TEXT: OnceLock<Regex> = OnceLock::new();
    TEXT.get_or_init(|| {
        Regex::new(r#"(?s)<text\s+start="([^"]*)"(?:\s+dur="([^"]*)")?[^>]*>(.*?)</text>"#)
            .expect("static regex")
    })
}

fn markup() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Parse a timedtext XML document into segments.
///
/// XML entities are decoded once here; segment text may still carry HTML
/// entities that were escaped twice upstream.
pub(crate) fn parse_timedtext(xml: &str) -> Vec<TranscriptSegment> {
    text_element()
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps.get(1)?.as_str().parse().unwrap_or(0.0);
            let duration = caps
                .get(2)
                .and_then(|d| d.as_str().parse().ok())
                .unwrap_or(0.0);
            let raw = caps.get(3)?.as_str();
            let text = html_escape::decode_html_entities(raw);
            let text = markup().replace_all(&text, "").trim().to_string();

            (!text.is_empty()).then_some(TranscriptSegment {
                text,
                start,
                duration,
            })
        })
        .collect()
}

/// Pick the first transcript matching `languages` in order, preferring
/// uploaded transcripts over generated ones for the same language.
fn find_transcript<'a>(
    handles: &'a [TranscriptHandle],
    languages: &[String],
) -> Option<&'a TranscriptHandle> {
    languages.iter().find_map(|lang| {
        handles
            .iter()
            .filter(|h| &h.language_code == lang)
            .min_by_key(|h| h.is_generated)
    })
}

#[async_trait]
impl TranscriptService for TimedTextClient {
    #[instrument(skip(self, languages), fields(languages = ?languages))]
    async fn get_transcript(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Vec<TranscriptSegment>, ServiceError> {
        let handles = self.list_transcripts(video_id).await?;
        let handle = find_transcript(&handles, languages).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "no transcript for video {} in languages {:?}",
                video_id, languages
            ))
        })?;
        self.fetch(handle).await
    }

    #[instrument(skip(self))]
    async fn list_transcripts(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<TranscriptHandle>, ServiceError> {
        let url = format!("{}/watch", self.watch_base);
        let http = &self.http;
        let url = &url;

        // A captcha page arrives as 200, so parsing happens inside the retry.
        let handles = self
            .retry
            .run("watch page", move || async move {
                let html = fetch_text(http, url, &[("v", video_id)]).await?;
                parse_caption_tracks(&html)
            })
            .await?;

        debug!("Watch page lists {} transcripts", handles.len());
        Ok(handles)
    }

    #[instrument(skip(self, handle), fields(language = %handle.language_code))]
    async fn fetch(
        &self,
        handle: &TranscriptHandle,
    ) -> std::result::Result<Vec<TranscriptSegment>, ServiceError> {
        let url = self.absolute_url(&handle.base_url);
        let xml = self.get_text(&url, &[]).await?;
        Ok(parse_timedtext(&xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_PAGE: &str = r#"<html><script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=de&fmt=srv3","name":{"simpleText":"German"},"languageCode":"de"},{"baseUrl":"/api/timedtext?v=abc123&lang=en&kind=asr","name":{"runs":[{"text":"English (auto-generated)"}]},"languageCode":"en","kind":"asr"},{"baseUrl":"/api/timedtext?v=abc123&lang=en","name":{"simpleText":"English"},"languageCode":"en"}],"audioTracks":[]}},"videoDetails":{}};</script></html>"#;

    #[test]
    fn test_parse_caption_tracks() {
        let handles = parse_caption_tracks(WATCH_PAGE).unwrap();
        assert_eq!(handles.len(), 3);

        assert_eq!(handles[0].language_code, "de");
        assert_eq!(handles[0].language, "German");
        assert_eq!(
            handles[0].base_url,
            "https://www.youtube.com/api/timedtext?v=abc123&lang=de"
        );

        assert!(handles[1].is_generated);
        assert_eq!(handles[1].language, "English (auto-generated)");
        assert!(!handles[2].is_generated);
    }

    #[test]
    fn test_page_without_captions_lists_nothing() {
        let handles = parse_caption_tracks("<html>no player here</html>").unwrap();
        assert!(handles.is_empty());
    }

    #[test]
    fn test_find_transcript_prefers_uploaded_and_language_order() {
        let handles = parse_caption_tracks(WATCH_PAGE).unwrap();

        let en = find_transcript(&handles, &["en".to_string()]).unwrap();
        assert!(!en.is_generated);

        let first = find_transcript(&handles, &["fr".to_string(), "de".to_string()]).unwrap();
        assert_eq!(first.language_code, "de");

        assert!(find_transcript(&handles, &["fr".to_string()]).is_none());
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r##"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">Tom &amp;amp; Jerry</text>
<text start="2.6" dur="1.9">it&amp;#39;s <font color="#E5E5E5">fine</font></text>
<text start="4.5" dur="0.5">   </text>
<text start="5">no duration</text>
</transcript>"##;

        let segments = parse_timedtext(xml);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "Tom &amp; Jerry");
        assert_eq!(segments[0].start, 0.5);
        assert_eq!(segments[1].text, "it&#39;s fine");
        assert_eq!(segments[2].duration, 0.0);
    }
}
