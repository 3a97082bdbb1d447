//! CLI output formatting utilities.

use crate::rag::preview;
use crate::session::Role;
use crate::vector_store::SearchResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a retrieved chunk.
    pub fn search_result(rank: usize, result: &SearchResult) {
        println!(
            "\n{} {} chunk #{} @ char {} (score: {:.2})",
            style(">>").green(),
            style(rank).bold(),
            result.chunk.index,
            style(result.chunk.offset).cyan(),
            result.score
        );
        println!("   {}", preview(&result.chunk.text, 200));
    }

    /// Print one conversation turn.
    pub fn turn(role: Role, content: &str) {
        let label = match role {
            Role::User => style("You").cyan().bold(),
            Role::Assistant => style("Assistant").green().bold(),
        };
        println!("{}: {}", label, content);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
