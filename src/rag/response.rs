//! RAG response generation.

use super::{AnswerSynthesizer, Retriever};
use crate::chunking::Chunk;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Retrieval followed by synthesis, over one index.
#[derive(Clone)]
pub struct RagEngine {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl RagEngine {
    pub fn new(retriever: Retriever, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
            top_k: 6,
        }
    }

    /// Set the default number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Ask a question against `index` with the default `k`.
    pub async fn ask(&self, index: &VectorIndex, question: &str) -> Result<RagResponse> {
        self.ask_with_top_k(index, question, self.top_k).await
    }

    #[instrument(skip(self, index), fields(question = %question))]
    pub async fn ask_with_top_k(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let sources = self.retriever.retrieve(index, question, k).await?;
        let chunks: Vec<Chunk> = sources.iter().map(|s| s.chunk.clone()).collect();

        let answer = self.synthesizer.answer(&chunks, question).await?;

        Ok(RagResponse { answer, sources })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<SearchResult>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n#{} @ char {} (score: {:.2})\n  {}",
                    source.chunk.index,
                    source.chunk.offset,
                    source.score,
                    preview(&source.chunk.text, 100)
                ));
            }
        }

        output
    }
}

/// First `max_chars` characters of `text` on one line.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
