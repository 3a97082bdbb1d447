//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod search;
mod transcript;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use search::run_search;
pub use transcript::run_transcript;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{LoadedVideo, Orchestrator};

/// Fail early, with a pointer to `doctor`, when credentials are missing.
fn ensure_ready(operation: Operation, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recall doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

/// Acquire and index a video behind a spinner.
async fn prepare_with_spinner(orchestrator: &Orchestrator, url: &str) -> anyhow::Result<LoadedVideo> {
    let spinner = Output::spinner("Fetching transcript and building index...");
    let result = orchestrator.prepare(url).await;
    spinner.finish_and_clear();

    match result {
        Ok(video) => {
            report_loaded(&video);
            Ok(video)
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}

fn report_loaded(video: &LoadedVideo) {
    Output::success(&format!(
        "Indexed video {} ({} chunks from {})",
        video.video_id,
        video.chunk_count(),
        video.source
    ));
    if let Some(note) = &video.diagnostic {
        Output::warning(note);
    }
}
