//! Prompt templates for Recall.
//!
//! The answer template can be replaced by a `rag.toml` in the custom prompts
//! directory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Prompt for grounded question answering.
///
/// `{{context}}` and `{{question}}` are filled per question; any other
/// `{{name}}` comes from the configured variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub template: String,
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            template: r#"You are a helpful assistant.
Answer ONLY using the provided transcript context.
If the context does not contain the answer, say "I don't know."

Context:
{{context}}

Question:
{{question}}

Answer:"#
                .to_string(),
            variables: HashMap::new(),
        }
    }
}

impl RagPrompts {
    /// Load the template, with optional custom directory and variables.
    pub fn load(custom_dir: Option<&str>, variables: &HashMap<String, String>) -> Result<Self> {
        let mut prompts = RagPrompts::default();

        if let Some(dir) = custom_dir {
            let rag_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        prompts.variables = variables.clone();
        Ok(prompts)
    }

    /// Fill the template with `context` and `question`.
    pub fn render_answer(&self, context: &str, question: &str) -> String {
        let mut vars = self.variables.clone();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        render(&self.template, &vars)
    }
}

/// Substitute `{{name}}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so a transcript containing
/// `{{question}}` stays literal. Unknown placeholders are left as written.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        match after.find("}}") {
            Some(close) => {
                let name = &after[..close];
                match vars.get(name.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
