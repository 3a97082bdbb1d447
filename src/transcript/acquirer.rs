//! Ordered fallback chain for obtaining a transcript.

use super::{is_usable, join_segments, strip_srt, TranscriptResult, TranscriptSource};
use crate::youtube::{
    CaptionFormat, CaptionService, CaptionTrack, MetadataService, ServiceError,
    TranscriptService,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const METADATA_CAVEAT: &str = "Note: A full transcript could not be retrieved. \
     Answers are based on the video's title and description only.";

const NOTHING_AVAILABLE: &str = "No transcript or description is available for this video. \
     It may be private, restricted, or have no captions enabled.";

/// Pick the caption track to download.
///
/// The first track whose language starts with `preferred_prefix` wins,
/// otherwise the first track listed.
pub fn select_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    preferred_prefix: &str,
) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language.starts_with(preferred_prefix))
        .or_else(|| tracks.first())
}

fn terminal_diagnostic(error: &ServiceError) -> String {
    match error {
        ServiceError::MissingCredential(name) => format!(
            "{} is not set. Add it to your config file or environment variables.",
            name
        ),
        other => format!("YouTube Data API fetch failed: {}", other),
    }
}

/// Runs the transcript fallback chain against injected collaborators.
///
/// Stages, each tried only when the previous one produced no usable text:
///
/// 1. Official captions (preferred language, else first track), as SRT.
///    401/403 falls through; any other failure ends the chain.
/// 2. Public transcript in the preferred languages.
/// 3. Public transcript in any listed language.
/// 4. Title and description, returned with a caveat.
pub struct TranscriptAcquirer {
    captions: Arc<dyn CaptionService>,
    transcripts: Arc<dyn TranscriptService>,
    metadata: Arc<dyn MetadataService>,
    preferred_caption_prefix: String,
    preferred_languages: Vec<String>,
}

impl TranscriptAcquirer {
    pub fn new(
        captions: Arc<dyn CaptionService>,
        transcripts: Arc<dyn TranscriptService>,
        metadata: Arc<dyn MetadataService>,
    ) -> Self {
        Self {
            captions,
            transcripts,
            metadata,
            preferred_caption_prefix: "en".to_string(),
            preferred_languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
        }
    }

    /// Set the language prefix used to choose among caption tracks.
    pub fn with_caption_prefix(mut self, prefix: &str) -> Self {
        self.preferred_caption_prefix = prefix.to_string();
        self
    }

    /// Set the ordered languages requested from the transcript service.
    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.preferred_languages = languages;
        self
    }

    /// Obtain the best available text for a video. Never fails.
    #[instrument(skip(self))]
    pub async fn acquire(&self, video_id: &str) -> TranscriptResult {
        match self.from_captions(video_id).await {
            Ok(Some(text)) => {
                info!("Using official captions");
                return TranscriptResult::found(text, TranscriptSource::Captions);
            }
            Ok(None) => debug!("No usable caption track"),
            Err(e) if e.is_authorization() => {
                debug!("Caption download not authorized, falling through: {}", e)
            }
            Err(e) => return TranscriptResult::unavailable(terminal_diagnostic(&e)),
        }

        if let Some(text) = self.from_preferred_transcript(video_id).await {
            info!("Using transcript in a preferred language");
            return TranscriptResult::found(text, TranscriptSource::PreferredTranscript);
        }

        if let Some(text) = self.from_any_transcript(video_id).await {
            info!("Using transcript in another language");
            return TranscriptResult::found(text, TranscriptSource::AnyTranscript);
        }

        self.from_metadata(video_id).await
    }

    async fn from_captions(&self, video_id: &str) -> Result<Option<String>, ServiceError> {
        let tracks = self.captions.list_captions(video_id).await?;

        let Some(track) = select_caption_track(&tracks, &self.preferred_caption_prefix) else {
            return Ok(None);
        };
        debug!("Selected caption track {} ({})", track.id, track.language);

        let raw = self
            .captions
            .download_caption(&track.id, CaptionFormat::Srt)
            .await?;
        let text = strip_srt(&String::from_utf8_lossy(&raw));

        Ok(is_usable(&text).then_some(text))
    }

    async fn from_preferred_transcript(&self, video_id: &str) -> Option<String> {
        match self
            .transcripts
            .get_transcript(video_id, &self.preferred_languages)
            .await
        {
            Ok(segments) => {
                let text = join_segments(&segments);
                is_usable(&text).then_some(text)
            }
            Err(e) => {
                warn!("Preferred-language transcript unavailable: {}", e);
                None
            }
        }
    }

    async fn from_any_transcript(&self, video_id: &str) -> Option<String> {
        let handles = match self.transcripts.list_transcripts(video_id).await {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Could not list transcripts: {}", e);
                return None;
            }
        };

        // Uploaded transcripts win over generated ones, keeping listing order.
        let handle = handles.iter().min_by_key(|h| h.is_generated)?;
        debug!("Fetching {} transcript", handle.language_code);

        match self.transcripts.fetch(handle).await {
            Ok(segments) => {
                let text = join_segments(&segments);
                is_usable(&text).then_some(text)
            }
            Err(e) => {
                warn!("Transcript fetch failed: {}", e);
                None
            }
        }
    }

    async fn from_metadata(&self, video_id: &str) -> TranscriptResult {
        let metadata = match self.metadata.get_video(video_id).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                return TranscriptResult::unavailable(format!(
                    "YouTube API returned no data for video ID '{}'.",
                    video_id
                ))
            }
            Err(e) => return TranscriptResult::unavailable(terminal_diagnostic(&e)),
        };

        let description = metadata.description.trim();
        if description.is_empty() {
            return TranscriptResult::unavailable(NOTHING_AVAILABLE);
        }

        warn!("Falling back to video metadata");
        TranscriptResult::with_caveat(
            format!(
                "Title: {}\n\nDescription:\n{}",
                metadata.title, description
            ),
            TranscriptSource::Metadata,
            METADATA_CAVEAT,
        )
    }
}
