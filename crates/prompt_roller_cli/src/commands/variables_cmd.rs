//! Template inspection command.
//!
//! Lists the placeholders a template uses, including those inside
//! conditional blocks, together with the class each one is validated as.

use colored::Colorize;
use prompt_engine::{FsTextFileStore, PathKind, TextFileStore};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "variables_cmd_tests.rs"]
mod tests;

/// A placeholder found in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    /// Class name, e.g. `text`, `file` or `markdown`.
    pub class: String,
    pub reserved: bool,
}

/// Reads `template` and describes every placeholder in it.
#[instrument(skip(config))]
pub async fn execute(template: &str, config: &AppConfig) -> Result<Vec<VariableInfo>, Error> {
    let engine = config.build_engine()?;
    let path = engine.path_validator().validate_path(template, PathKind::File)?;
    let content = FsTextFileStore::new()
        .read_text_file(path.as_path())
        .await
        .map_err(prompt_engine::Error::from)?;

    let reserved = engine.reserved();
    let variables = engine
        .extract_variables(&content)?
        .into_iter()
        .map(|name| VariableInfo {
            class: reserved.classify(&name).to_string(),
            reserved: reserved.contains(&name),
            name,
        })
        .collect();

    Ok(variables)
}

/// Formats the variable list for the terminal.
pub fn format_variables(template: &str, variables: &[VariableInfo]) -> String {
    let mut output = format!("{} {}\n", "Variables in".bold(), template.bright_cyan());

    if variables.is_empty() {
        output.push_str(&format!("  {}\n", "(none)".dimmed()));
        return output;
    }

    for variable in variables {
        let marker = if variable.reserved {
            " [reserved]".yellow().to_string()
        } else {
            String::new()
        };
        output.push_str(&format!(
            "  {} ({}){}\n",
            variable.name.bold(),
            variable.class,
            marker
        ));
    }

    output
}
