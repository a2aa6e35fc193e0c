//! Prompt generation command.
//!
//! ```bash
//! prompt-roller generate --template prompts/review.md --var name=John --var task="Code Review"
//! prompt-roller generate --template prompts/review.md --vars vars.toml --output out/review.md
//! ```

use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use prompt_engine::{FsTextFileStore, GenerationReport, SubstitutionMode, Variables};
use tracing::{debug, instrument};

use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "generate_cmd_tests.rs"]
mod tests;

/// Arguments for the `generate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Path to the template file.
    #[arg(long)]
    pub template: String,

    /// Variable assignment, repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// JSON or TOML file with variables. `--var` values take precedence.
    #[arg(long = "vars", value_name = "FILE")]
    pub vars_file: Option<PathBuf>,

    /// Write the generated prompt to this path instead of stdout.
    #[arg(long)]
    pub output: Option<String>,

    /// Fail when any placeholder has no value.
    #[arg(long)]
    pub strict: bool,

    /// Print the full generation report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Parses a `KEY=VALUE` argument. The value may contain further `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Runs a generation and returns its report.
///
/// # Errors
///
/// Returns an error only when the configuration or the variables file
/// cannot be used. Generation failures are reported in the returned
/// [`GenerationReport`].
#[instrument(skip(config), fields(template = %args.template))]
pub async fn execute(args: &GenerateArgs, config: &AppConfig) -> Result<GenerationReport, Error> {
    let variables = collect_variables(args)?;
    debug!("Collected {} variables", variables.len());

    let mut config = config.clone();
    if args.strict {
        config.engine.mode = SubstitutionMode::Strict;
    }
    let engine = config.build_engine()?;

    let store = FsTextFileStore::new();
    let report = match &args.output {
        Some(output) => {
            engine
                .render_to_file(&store, &args.template, output, &variables)
                .await
        }
        None => {
            engine
                .generate_from_file(&store, &args.template, &variables)
                .await
        }
    };

    Ok(report)
}

/// Merges the variables file (if any) with `--var` assignments.
pub fn collect_variables(args: &GenerateArgs) -> Result<Variables, Error> {
    let mut variables = match &args.vars_file {
        Some(path) => load_variables_file(path)?,
        None => Variables::new(),
    };

    for (name, value) in &args.vars {
        variables.insert(name.as_str(), value.as_str());
    }

    Ok(variables)
}

/// Loads variables from a JSON or TOML file, chosen by extension.
pub fn load_variables_file(path: &Path) -> Result<Variables, Error> {
    let content = std::fs::read_to_string(path).map_err(Error::LoadFile)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(Error::ParseJsonFile),
        Some("toml") => toml::from_str(&content).map_err(Error::ParseTomlFile),
        _ => Err(Error::InvalidArguments(format!(
            "Unsupported variables file '{}'. Use a .json or .toml file.",
            path.display()
        ))),
    }
}

/// Formats a report for the terminal.
///
/// With `json` the whole report is serialized. Otherwise a successful
/// report yields its content, or a confirmation when it was written to
/// `output`, and a failed report yields its error.
pub fn format_report(
    report: &GenerationReport,
    json: bool,
    output: Option<&str>,
) -> Result<String, Error> {
    if json {
        return serde_json::to_string_pretty(report)
            .map_err(|e| Error::Output(format!("Failed to serialize to JSON: {}", e)));
    }

    if !report.success {
        return Ok(format!(
            "{} {}",
            "✗".red(),
            report.error.as_deref().unwrap_or("Generation failed")
        ));
    }

    let mut text = match output {
        Some(path) => format!("{} Prompt written to {}", "✓".green(), path.bold()),
        None => report.content.clone().unwrap_or_default(),
    };

    if output.is_some() && !report.variables.remaining.is_empty() {
        text.push_str(&format!(
            "\n{} Unresolved placeholders: {}",
            "⚠".yellow(),
            report.variables.remaining.join(", ")
        ));
    }

    Ok(text)
}
