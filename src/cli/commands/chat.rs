//! Interactive chat about one video at a time.

use super::{ensure_ready, report_loaded};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Exit,
    Clear,
    History,
    NewVideo(&'a str),
    Question(&'a str),
    Empty,
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    if line.eq_ignore_ascii_case("clear") {
        return ChatInput::Clear;
    }
    if line.eq_ignore_ascii_case("history") {
        return ChatInput::History;
    }
    if let Some(url) = line.strip_prefix("new ") {
        return ChatInput::NewVideo(url.trim());
    }
    ChatInput::Question(line)
}

async fn load(session: &mut Session, orchestrator: &Orchestrator, url: &str) -> bool {
    let spinner = Output::spinner("Fetching transcript and building index...");
    let result = session.load_video(url, orchestrator).await;
    spinner.finish_and_clear();

    match result {
        Ok(video) => {
            report_loaded(video);
            true
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            false
        }
    }
}

/// Run the interactive chat command.
pub async fn run_chat(url: &str, settings: Settings) -> Result<()> {
    ensure_ready(Operation::Ask, &settings)?;

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();
    debug!("Started session {}", session.id());

    if !load(&mut session, &orchestrator, url).await {
        anyhow::bail!("could not load video");
    }

    println!("\n{}", style("Recall Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the video, or 'exit' to quit. 'clear' resets the chat, 'new <url>' loads another video, 'history' shows the conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Clear => {
                session.clear_chat();
                Output::info("Conversation history cleared.");
            }
            ChatInput::History => {
                if session.conversation().is_empty() {
                    Output::info("No messages yet.");
                }
                for turn in session.conversation().turns() {
                    Output::turn(turn.role, &turn.content);
                }
            }
            ChatInput::NewVideo(new_url) => {
                session.new_video();
                load(&mut session, &orchestrator, new_url).await;
            }
            ChatInput::Question(question) => {
                if session.video().is_none() {
                    Output::warning("No video loaded. Use 'new <url>' to load one.");
                    continue;
                }

                let spinner = Output::spinner("Thinking...");
                let result = session.ask(question, &orchestrator).await;
                spinner.finish_and_clear();

                match result {
                    Ok(response) => {
                        println!("\n{} {}\n", style("Recall:").cyan().bold(), response.answer);
                    }
                    Err(e) => {
                        Output::error(&format!("Error: {}", e));
                    }
                }
            }
        }
    }

    Ok(())
}
