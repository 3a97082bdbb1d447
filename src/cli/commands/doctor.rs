//! Doctor command - verify credentials and configuration.

use crate::cli::preflight::{requirements, Operation};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Recall Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let credential_checks = check_credentials(settings);
    for check in &credential_checks {
        check.print();
    }
    checks.extend(credential_checks);

    println!();

    println!("{}", style("Providers").bold());
    Output::kv(
        "Embeddings",
        &format!(
            "{} ({}, {} dims)",
            settings.embedding.provider, settings.embedding.model, settings.embedding.dimensions
        ),
    );
    Output::kv(
        "Language model",
        &format!(
            "{} ({}, temperature {})",
            settings.llm.provider, settings.llm.model, settings.llm.temperature
        ),
    );
    Output::kv(
        "Chunking",
        &format!(
            "{} chars, {} overlap, top {}",
            settings.chunking.chunk_size, settings.chunking.chunk_overlap, settings.rag.top_k
        ),
    );

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Recall.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Recall is ready to use.");
    }

    Ok(())
}

fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let mut seen = Vec::new();
    requirements(Operation::Ask, settings)
        .into_iter()
        .filter(|r| {
            // OpenAI may back both embeddings and the language model.
            let first = !seen.contains(&r.env_var);
            seen.push(r.env_var);
            first
        })
        .map(|r| {
            if r.present {
                CheckResult::ok(r.env_var, &format!("configured ({})", r.purpose))
            } else {
                CheckResult::error(
                    r.env_var,
                    &format!("not set (needed for {})", r.purpose),
                    &format!("Set with: export {}='...'", r.env_var),
                )
            }
        })
        .collect()
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: recall config init",
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok("Settings", "valid"),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix with: recall config edit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingProvider, LlmProvider};

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_shared_credential_is_checked_once() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingProvider::OpenAI;
        settings.llm.provider = LlmProvider::OpenAI;
        settings.youtube.api_key = Some("yt".to_string());
        settings.embedding.api_key = Some("sk".to_string());

        let checks = check_credentials(&settings);
        let names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["YOUTUBE_API_KEY", "OPENAI_API_KEY"]);
        assert!(checks.iter().all(|c| c.status == CheckStatus::Ok));
    }

    #[test]
    fn test_missing_config_file_is_a_warning() {
        let check = check_config_file(Path::new("/nonexistent/recall/config.toml"));
        assert_eq!(check.status, CheckStatus::Warning);
    }
}
