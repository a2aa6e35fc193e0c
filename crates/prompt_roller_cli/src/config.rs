//! Configuration management for the PromptRoller CLI.
//!
//! The configuration is stored in TOML format and can be loaded from a
//! specified file path or from `prompt-roller.toml` in the working
//! directory. Every section is optional.
//!
//! ```toml
//! [engine]
//! mode = "strict"
//! escape_html = true
//!
//! [paths]
//! allowed_prefixes = ["/srv/prompts"]
//! require_directory_slash = true
//!
//! [reserved]
//! extended = true
//!
//! [reserved.names]
//! release_date = "date"
//! changelog_markdown = "markdown"
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use prompt_engine::{
    EngineConfig, PathValidator, ReservedVariables, TemplateEngine, VariableClass,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "prompt-roller.toml";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the PromptRoller CLI application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Template engine behavior.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Absolute path allow-list.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Reserved variable registry.
    #[serde(default)]
    pub reserved: ReservedConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file does not exist, cannot be read,
    /// or does not match the configuration schema.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use prompt_roller_cli::config::AppConfig;
    ///
    /// match AppConfig::load(Path::new("./prompt-roller.toml")) {
    ///     Ok(config) => println!("Mode: {:?}", config.engine.mode),
    ///     Err(e) => eprintln!("Failed to load config: {}", e),
    /// }
    /// ```
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Loads the configuration for a command invocation.
    ///
    /// An explicit path must exist. Without one, `prompt-roller.toml` in
    /// `dir` is used when present and the defaults otherwise.
    pub fn discover(explicit: Option<&str>, dir: &Path) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::load(Path::new(path));
        }

        let default_path = dir.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            debug!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Builds the reserved registry described by the `[reserved]` section.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unknown class name and the engine's
    /// validation error for an invalid variable name.
    pub fn reserved_variables(&self) -> Result<ReservedVariables, Error> {
        let mut reserved = if self.reserved.extended {
            ReservedVariables::extended()
        } else {
            ReservedVariables::default()
        };

        for (name, class) in &self.reserved.names {
            let class: VariableClass = class
                .parse()
                .map_err(|e| Error::Config(format!("Reserved variable `{}`: {}", name, e)))?;
            reserved.register(name, class)?;
        }

        Ok(reserved)
    }

    /// Creates a template engine configured from this file.
    pub fn build_engine(&self) -> Result<TemplateEngine, Error> {
        let mut engine =
            TemplateEngine::with_config(self.engine.clone()).with_reserved(self.reserved_variables()?);

        if self.paths.require_directory_slash {
            engine = engine
                .with_path_validator(PathValidator::new().require_directory_trailing_slash(true));
        }

        for prefix in &self.paths.allowed_prefixes {
            engine.path_validator().allow_prefix(prefix);
        }

        Ok(engine)
    }
}

/// Path validation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Absolute path prefixes accepted in addition to the working directory
    /// and the system temporary directory.
    #[serde(default)]
    pub allowed_prefixes: Vec<PathBuf>,

    /// Reject directory paths that do not end with `/`.
    #[serde(default)]
    pub require_directory_slash: bool,
}

/// Reserved variable registry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservedConfig {
    /// Start from the extended registry instead of the core one.
    #[serde(default)]
    pub extended: bool,

    /// Additional reserved names mapped to a class name such as `file`,
    /// `directory`, `markdown`, `text`, `number` or `date`.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}
