//! Transcript command: run only the acquisition stage.

use super::ensure_ready;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::youtube::VideoId;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(url: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let video_id = VideoId::from_url(url)?;
    ensure_ready(Operation::Transcript, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Fetching transcript for {}...", video_id));
    let result = orchestrator.acquire_transcript(&video_id).await;
    spinner.finish_and_clear();

    let (text, source, caveat) = match result.into_parts() {
        Ok(parts) => parts,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    if let Some(note) = &caveat {
        Output::warning(note);
    }

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &text)?;
            Output::success(&format!(
                "Wrote {} characters from {} to {}",
                text.chars().count(),
                source,
                path.display()
            ));
        }
        None => {
            Output::info(&format!("Source: {}", source));
            println!("{}", text);
        }
    }

    Ok(())
}
