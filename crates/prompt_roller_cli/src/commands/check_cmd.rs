//! Single-value validation commands.
//!
//! ```bash
//! prompt-roller check-name project_name
//! prompt-roller check-path docs/ --directory
//! ```

use colored::Colorize;
use prompt_engine::{NormalizedPath, PathKind, VariableKeyValidator};
use tracing::instrument;

use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "check_cmd_tests.rs"]
mod tests;

/// Validates a variable name, honoring `reserved_only` from the config.
#[instrument(skip(config))]
pub fn check_name(name: &str, config: &AppConfig) -> Result<(), Error> {
    let validator = if config.engine.reserved_only {
        VariableKeyValidator::reserved_only(config.reserved_variables()?)
    } else {
        VariableKeyValidator::new()
    };

    validator.validate_key(name)?;
    Ok(())
}

/// Validates a path and returns its normalized form.
#[instrument(skip(config))]
pub fn check_path(path: &str, directory: bool, config: &AppConfig) -> Result<NormalizedPath, Error> {
    let kind = if directory {
        PathKind::Directory
    } else {
        PathKind::File
    };

    let engine = config.build_engine()?;
    Ok(engine.path_validator().validate_path(path, kind)?)
}

/// Formats the outcome of a check for the terminal.
pub fn format_check(subject: &str, result: &Result<String, Error>) -> String {
    match result {
        Ok(normalized) if normalized != subject => format!(
            "{} {} (normalized: {})",
            "✓".green(),
            subject.bold(),
            normalized
        ),
        Ok(_) => format!("{} {}", "✓".green(), subject.bold()),
        Err(e) => format!("{} {}: {}", "✗".red(), subject.bold(), e),
    }
}
