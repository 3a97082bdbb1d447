use async_trait::async_trait;
use recall::chunking::Chunk;
use recall::config::Settings;
use recall::embedding::Embedder;
use recall::llm::LanguageModel;
use recall::orchestrator::Orchestrator;
use recall::rag::{AnswerSynthesizer, Retriever};
use recall::session::{Role, Session, SessionState};
use recall::transcript::{TranscriptAcquirer, TranscriptSource};
use recall::vector_store::VectorIndex;
use recall::youtube::{
    CaptionFormat, CaptionService, CaptionTrack, MetadataService, ServiceError,
    TranscriptHandle, TranscriptSegment, TranscriptService, VideoMetadata,
};
use recall::{RecallError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

type ServiceResult<T> = std::result::Result<T, ServiceError>;

const DIMENSIONS: usize = 64;

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Hashed bag-of-words vectors, so shared words mean higher similarity.
struct BagOfWordsEmbedder;

impl BagOfWordsEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMENSIONS];
        for word in words(text) {
            let bucket = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[bucket % DIMENSIONS] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

/// Answers with the context sentence sharing the most words with the
/// question, or abstains when the context is empty.
struct ExtractiveModel;

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &prompt[from..];
    rest.find(end).map(|i| &rest[..i]).unwrap_or(rest).trim()
}

#[async_trait]
impl LanguageModel for ExtractiveModel {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        let context = section(prompt, "Context:\n", "\n\nQuestion:");
        let question: HashSet<String> = words(section(prompt, "Question:\n", "\n\nAnswer:")).collect();

        let best = context
            .split_inclusive('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .max_by_key(|sentence| {
                words(sentence)
                    .collect::<HashSet<_>>()
                    .intersection(&question)
                    .count()
            });

        Ok(best.map(str::to_string).unwrap_or_else(|| "I don't know.".to_string()))
    }

    fn model_name(&self) -> &str {
        "extractive"
    }
}

struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        Err(RecallError::ProviderUnavailable("rate limited".to_string()))
    }

    fn model_name(&self) -> &str {
        "unavailable"
    }
}

/// Captions are always forbidden; public transcripts come from a map.
#[derive(Default)]
struct FakeYoutube {
    transcripts: HashMap<String, String>,
}

impl FakeYoutube {
    fn with_transcript(mut self, video_id: &str, text: &str) -> Self {
        self.transcripts.insert(video_id.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl CaptionService for FakeYoutube {
    async fn list_captions(&self, _video_id: &str) -> ServiceResult<Vec<CaptionTrack>> {
        Ok(vec![CaptionTrack {
            id: "cap-1".to_string(),
            language: "en".to_string(),
        }])
    }

    async fn download_caption(
        &self,
        _caption_id: &str,
        _format: CaptionFormat,
    ) -> ServiceResult<Vec<u8>> {
        Err(ServiceError::Unauthorized { status: 403 })
    }
}

#[async_trait]
impl TranscriptService for FakeYoutube {
    async fn get_transcript(
        &self,
        video_id: &str,
        _languages: &[String],
    ) -> ServiceResult<Vec<TranscriptSegment>> {
        self.transcripts
            .get(video_id)
            .map(|text| {
                vec![TranscriptSegment {
                    text: text.clone(),
                    start: 0.0,
                    duration: 5.0,
                }]
            })
            .ok_or_else(|| ServiceError::NotFound(video_id.to_string()))
    }

    async fn list_transcripts(&self, _video_id: &str) -> ServiceResult<Vec<TranscriptHandle>> {
        Ok(Vec::new())
    }

    async fn fetch(&self, handle: &TranscriptHandle) -> ServiceResult<Vec<TranscriptSegment>> {
        Err(ServiceError::NotFound(handle.language_code.clone()))
    }
}

#[async_trait]
impl MetadataService for FakeYoutube {
    async fn get_video(&self, _video_id: &str) -> ServiceResult<Option<VideoMetadata>> {
        Ok(None)
    }
}

const CAT_TRANSCRIPT: &str = "The cat sat on the mat. The mat was red.";
const CAT_URL: &str = "https://www.youtube.com/watch?v=abc123";

fn orchestrator_with(model: Arc<dyn LanguageModel>) -> Orchestrator {
    let youtube = Arc::new(FakeYoutube::default().with_transcript("abc123", CAT_TRANSCRIPT));
    let acquirer = TranscriptAcquirer::new(youtube.clone(), youtube.clone(), youtube);

    Orchestrator::with_components(
        Settings::default(),
        acquirer,
        Arc::new(BagOfWordsEmbedder),
        model,
    )
    .unwrap()
}

#[tokio::test]
async fn test_prepare_and_ask() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));

    let video = assert_ok!(orchestrator.prepare(CAT_URL).await);
    assert_eq!(video.video_id.as_str(), "abc123");
    assert_eq!(video.source, TranscriptSource::PreferredTranscript);
    assert_eq!(video.chunk_count(), 1);
    assert!(video.diagnostic.is_none());

    let response = orchestrator
        .ask(&video, "What color was the mat?", Some(2))
        .await
        .unwrap();

    assert!(response.answer.contains("red"));
    assert!(!response.answer.contains("I don't know."));
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].chunk.text, CAT_TRANSCRIPT);
}

#[tokio::test]
async fn test_short_link_and_search() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));

    let video = orchestrator.prepare("https://youtu.be/abc123").await.unwrap();
    let results = orchestrator.search(&video, "red mat", None).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].score > 0.0);
}

#[tokio::test]
async fn test_prepare_rejects_other_hosts() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));

    let err = assert_err!(orchestrator.prepare("https://vimeo.com/123456").await);
    assert!(matches!(err, RecallError::InvalidInput(_)));
}

#[tokio::test]
async fn test_prepare_without_any_transcript() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));

    let err = orchestrator
        .prepare("https://www.youtube.com/watch?v=missing1")
        .await
        .unwrap_err();
    assert!(
        matches!(err, RecallError::TranscriptUnavailable(msg) if msg.contains("no data for video ID 'missing1'"))
    );
}

#[tokio::test]
async fn test_session_lifecycle() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));
    let mut session = Session::new();

    let err = session.ask("Anything?", &orchestrator).await.unwrap_err();
    assert!(matches!(err, RecallError::Session(_)));
    assert_eq!(session.state(), SessionState::Uninitialized);

    session.load_video(CAT_URL, &orchestrator).await.unwrap();
    assert_eq!(session.state(), SessionState::Indexed);

    let response = session
        .ask("What color was the mat?", &orchestrator)
        .await
        .unwrap();
    assert_eq!(response.answer, "The mat was red.");
    assert_eq!(session.state(), SessionState::Indexed);

    let turns = session.conversation().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "What color was the mat?");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "The mat was red.");

    session.clear_chat();
    assert!(session.conversation().is_empty());
    assert_eq!(session.state(), SessionState::Indexed);
    assert!(session.video().is_some());

    session.new_video();
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert!(session.video().is_none());
}

#[tokio::test]
async fn test_failed_load_leaves_session_uninitialized() {
    let orchestrator = orchestrator_with(Arc::new(ExtractiveModel));
    let mut session = Session::new();

    session.load_video(CAT_URL, &orchestrator).await.unwrap();
    session
        .ask("What color was the mat?", &orchestrator)
        .await
        .unwrap();

    let err = session
        .load_video("https://www.youtube.com/watch?v=missing1", &orchestrator)
        .await
        .unwrap_err();
    assert!(matches!(err, RecallError::TranscriptUnavailable(_)));
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert!(session.video().is_none());
    assert!(session.conversation().is_empty());
}

#[tokio::test]
async fn test_failed_ask_keeps_session_ready() {
    let orchestrator = orchestrator_with(Arc::new(UnavailableModel));
    let mut session = Session::new();
    session.load_video(CAT_URL, &orchestrator).await.unwrap();

    let err = session.ask("What color?", &orchestrator).await.unwrap_err();
    assert!(matches!(err, RecallError::ProviderUnavailable(_)));
    assert_eq!(session.state(), SessionState::Indexed);
    assert!(session.conversation().is_empty());

    let err = session.ask("   ", &orchestrator).await.unwrap_err();
    assert!(matches!(err, RecallError::InvalidInput(_)));
    assert_eq!(session.state(), SessionState::Indexed);
    assert!(session.conversation().is_empty());
}

#[tokio::test]
async fn test_verbatim_query_ranks_its_chunk_first() {
    let chunks = vec![
        Chunk::new(0, "Bread needs flour, water, salt and yeast.", 0),
        Chunk::new(1, "The orbit of the moon takes about a month.", 42),
        Chunk::new(2, "Knead the dough until it is smooth.", 86),
    ];
    let embedder: Arc<dyn Embedder> = Arc::new(BagOfWordsEmbedder);
    let index = VectorIndex::build(chunks, embedder.as_ref()).await.unwrap();

    let results = Retriever::new(embedder)
        .retrieve(&index, "The orbit of the moon takes about a month.", 3)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].chunk.index, 1);
    assert!((results[0].score - 1.0).abs() < 1e-5);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_empty_context_abstains() {
    let synthesizer = AnswerSynthesizer::new(Arc::new(ExtractiveModel));
    let answer = synthesizer.answer(&[], "What color was the mat?").await.unwrap();
    assert_eq!(answer, "I don't know.");
}
