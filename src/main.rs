//! Recall CLI entry point.

use anyhow::Result;
use clap::Parser;
use recall::cli::{commands, Cli, Commands};
use recall::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("recall={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };

    let load = || Settings::load_from(Some(config_path.as_path()));

    match &cli.command {
        Commands::Chat { url } => {
            commands::run_chat(url, load()?).await?;
        }

        Commands::Ask {
            url,
            question,
            top_k,
        } => {
            commands::run_ask(url, question, *top_k, load()?).await?;
        }

        Commands::Search { url, query, top_k } => {
            commands::run_search(url, query, *top_k, load()?).await?;
        }

        Commands::Transcript { url, output } => {
            commands::run_transcript(url, output.clone(), load()?).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&load()?, &config_path)?;
        }

        Commands::Config { action } => {
            // An invalid file must not stop `config edit` from fixing it.
            let settings = load().unwrap_or_default();
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
