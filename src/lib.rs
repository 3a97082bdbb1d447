//! Recall - Ask questions about YouTube videos
//!
//! A CLI tool that fetches a video's transcript, indexes it in memory and
//! answers questions about it with retrieval-augmented generation.
//!
//! # Overview
//!
//! Recall allows you to:
//! - Fetch a transcript through the YouTube Data API or public caption tracks
//! - Split it into overlapping chunks and embed them
//! - Ask questions grounded in the most relevant chunks
//! - Chat about one video at a time, switching videos mid-session
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `youtube` - URL parsing and the YouTube services
//! - `transcript` - Staged transcript acquisition
//! - `chunking` - Recursive character splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `llm` - Hosted chat completion
//! - `rag` - Retrieval and answer synthesis
//! - `orchestrator` - Pipeline coordination
//! - `session` - Conversation state for interactive use
//!
//! # Example
//!
//! ```rust,no_run
//! use recall::config::Settings;
//! use recall::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let video = orchestrator
//!         .prepare("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("Indexed {} chunks", video.chunk_count());
//!
//!     let response = orchestrator.ask(&video, "What is this video about?", None).await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retry;
pub mod session;
pub mod transcript;
pub mod vector_store;
pub mod youtube;

pub use error::{RecallError, Result};
