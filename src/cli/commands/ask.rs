//! Ask command implementation.

use super::{ensure_ready, prepare_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(url: &str, question: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    ensure_ready(Operation::Ask, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let video = prepare_with_spinner(&orchestrator, url).await?;

    let spinner = Output::spinner("Thinking...");

    match orchestrator.ask(&video, question, top_k).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for (rank, source) in response.sources.iter().enumerate() {
                    Output::search_result(rank + 1, source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
