//! Conversation session over one video at a time.
//!
//! ```text
//! Uninitialized --load_video--> Acquiring --ok--> Indexed --ask--> Querying
//!       ^                           |               ^  |              |
//!       +-------------err-----------+               |  +--new_video-->+ Uninitialized
//!                                                   +------done-------+
//! ```
//!
//! Every mutating method takes `&mut self`, so a session runs one operation
//! at a time. The [`Orchestrator`] is only borrowed.

mod conversation;

pub use conversation::{ConversationState, Role, Turn};

use crate::error::{RecallError, Result};
use crate::orchestrator::{LoadedVideo, Orchestrator};
use crate::rag::RagResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No video loaded.
    Uninitialized,
    /// Fetching and indexing a transcript.
    Acquiring,
    /// Ready for questions.
    Indexed,
    /// Answering a question.
    Querying,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Indexed => write!(f, "indexed"),
            SessionState::Querying => write!(f, "querying"),
        }
    }
}

pub struct Session {
    id: Uuid,
    state: SessionState,
    video: Option<LoadedVideo>,
    conversation: ConversationState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Uninitialized,
            video: None,
            conversation: ConversationState::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn video(&self) -> Option<&LoadedVideo> {
        self.video.as_ref()
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Acquire and index a video, replacing any previous one.
    ///
    /// The conversation is cleared either way. On failure the session is
    /// left uninitialized.
    #[instrument(skip(self, orchestrator), fields(session = %self.id))]
    pub async fn load_video(&mut self, url: &str, orchestrator: &Orchestrator) -> Result<&LoadedVideo> {
        self.state = SessionState::Acquiring;
        self.video = None;
        self.conversation.clear();

        match orchestrator.prepare(url).await {
            Ok(video) => {
                info!("Session ready with {} chunks", video.chunk_count());
                self.state = SessionState::Indexed;
                Ok(self.video.insert(video))
            }
            Err(e) => {
                warn!("Failed to load video: {}", e);
                self.state = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    /// Ask with the configured `k`.
    pub async fn ask(&mut self, question: &str, orchestrator: &Orchestrator) -> Result<RagResponse> {
        self.ask_with_top_k(question, None, orchestrator).await
    }

    /// Answer a question about the loaded video.
    ///
    /// On success the question and answer are appended to the conversation.
    /// On failure nothing is appended and the session stays ready.
    #[instrument(skip(self, orchestrator), fields(session = %self.id))]
    pub async fn ask_with_top_k(
        &mut self,
        question: &str,
        k: Option<usize>,
        orchestrator: &Orchestrator,
    ) -> Result<RagResponse> {
        let Some(video) = self.video.as_ref().filter(|_| self.state == SessionState::Indexed)
        else {
            return Err(RecallError::Session(
                "No video is loaded. Load a video before asking questions.".to_string(),
            ));
        };

        self.state = SessionState::Querying;
        let result = orchestrator.ask(video, question, k).await;
        self.state = SessionState::Indexed;

        let response = result?;
        self.conversation
            .record_exchange(question.trim(), &response.answer);
        Ok(response)
    }

    /// Drop the loaded video and its conversation.
    pub fn new_video(&mut self) {
        self.video = None;
        self.conversation.clear();
        self.state = SessionState::Uninitialized;
    }

    /// Clear the conversation, keeping the loaded video.
    pub fn clear_chat(&mut self) {
        self.conversation.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_uninitialized() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.video().is_none());
        assert!(session.conversation().is_empty());
        assert_ne!(session.id(), Session::new().id());
    }

    #[test]
    fn test_new_video_resets() {
        let mut session = Session::new();
        session.conversation.record_exchange("q", "a");
        session.state = SessionState::Indexed;

        session.clear_chat();
        assert!(session.conversation().is_empty());
        assert_eq!(session.state(), SessionState::Indexed);

        session.new_video();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
