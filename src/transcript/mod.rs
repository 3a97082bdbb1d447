//! Transcript acquisition.
//!
//! A transcript is obtained by trying several sources in priority order
//! (see [`TranscriptAcquirer`]). The outcome is always a [`TranscriptResult`];
//! collaborator failures never escape as errors.

mod acquirer;
mod srt;

pub use acquirer::TranscriptAcquirer;
pub use srt::strip_srt;

use crate::error::{RecallError, Result};
use crate::youtube::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// Which fallback stage produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    /// Official caption track from the Data API.
    Captions,
    /// Public transcript in one of the preferred languages.
    PreferredTranscript,
    /// Public transcript in whatever language was listed.
    AnyTranscript,
    /// Video title and description.
    Metadata,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Captions => write!(f, "official captions"),
            TranscriptSource::PreferredTranscript => write!(f, "transcript (preferred language)"),
            TranscriptSource::AnyTranscript => write!(f, "transcript (any language)"),
            TranscriptSource::Metadata => write!(f, "title and description"),
        }
    }
}

/// Best-effort transcript text with an optional diagnostic.
///
/// When there is no text, the diagnostic always explains why. Text may
/// still come with a caveat, e.g. when it was built from metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    text: Option<String>,
    diagnostic: Option<String>,
    source: Option<TranscriptSource>,
}

impl TranscriptResult {
    pub fn found(text: String, source: TranscriptSource) -> Self {
        Self {
            text: Some(text),
            diagnostic: None,
            source: Some(source),
        }
    }

    pub fn with_caveat(text: String, source: TranscriptSource, caveat: impl Into<String>) -> Self {
        Self {
            text: Some(text),
            diagnostic: Some(caveat.into()),
            source: Some(source),
        }
    }

    pub fn unavailable(diagnostic: impl Into<String>) -> Self {
        Self {
            text: None,
            diagnostic: Some(diagnostic.into()),
            source: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn source(&self) -> Option<TranscriptSource> {
        self.source
    }

    pub fn is_available(&self) -> bool {
        self.text.is_some()
    }

    /// Split into text, source and caveat, or fail with the diagnostic.
    pub fn into_parts(self) -> Result<(String, TranscriptSource, Option<String>)> {
        match (self.text, self.source) {
            (Some(text), Some(source)) => Ok((text, source, self.diagnostic)),
            _ => Err(RecallError::TranscriptUnavailable(
                self.diagnostic
                    .unwrap_or_else(|| "No transcript could be retrieved.".to_string()),
            )),
        }
    }
}

/// Text is usable when something other than whitespace remains.
pub fn is_usable(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Decode HTML entities (`&amp;`, `&#39;`, ...).
pub fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Join segment texts with single spaces, decoding entities in each.
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| unescape(&s.text))
        .collect::<Vec<_>>()
        .join(" ")
}
