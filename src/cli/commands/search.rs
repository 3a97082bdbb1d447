//! Search command implementation.

use super::{ensure_ready, prepare_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(url: &str, query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    ensure_ready(Operation::Search, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let video = prepare_with_spinner(&orchestrator, url).await?;

    let spinner = Output::spinner("Searching transcript...");
    let results = orchestrator.search(&video, query, top_k).await;
    spinner.finish_and_clear();

    let results = results?;
    if results.is_empty() {
        Output::info("No matching chunks found.");
        return Ok(());
    }

    Output::header(&format!("Results for \"{}\"", query));
    for (rank, result) in results.iter().enumerate() {
        Output::search_result(rank + 1, result);
    }

    Ok(())
}
