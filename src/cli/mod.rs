//! CLI module for Recall.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Recall - ask questions about YouTube videos
///
/// Fetches a video's transcript, indexes it in memory and answers questions
/// grounded in what was said.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a video and start an interactive chat about it
    Chat {
        /// YouTube video URL
        url: String,
    },

    /// Ask a single question about a video
    Ask {
        /// YouTube video URL
        url: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the transcript chunks most relevant to a query
    Search {
        /// YouTube video URL
        url: String,

        /// Search query
        query: String,

        /// Number of chunks to show
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Fetch a video's transcript without indexing it
    Transcript {
        /// YouTube video URL
        url: String,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_top_k() {
        let cli = Cli::try_parse_from([
            "recall",
            "-vv",
            "ask",
            "https://youtu.be/abc123",
            "What color was the mat?",
            "-k",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { url, question, top_k } => {
                assert_eq!(url, "https://youtu.be/abc123");
                assert_eq!(question, "What color was the mat?");
                assert_eq!(top_k, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["recall", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
