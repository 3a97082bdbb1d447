//! RAG (Retrieval-Augmented Generation) over a single transcript.
//!
//! A [`Retriever`] finds relevant chunks in a [`VectorIndex`](crate::vector_store::VectorIndex),
//! the [`AnswerSynthesizer`] turns them into a grounded answer, and
//! [`RagEngine`] runs the two in sequence.

mod context;
mod response;
mod synthesizer;

pub use context::{format_context_for_prompt, Retriever};
pub use response::{preview, RagEngine, RagResponse};
pub use synthesizer::AnswerSynthesizer;
