use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the PromptRoller CLI application.
///
/// A generation that completes with `success == false` is not an error at
/// this level; it is reported through the generation report instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error occurred while loading or parsing configuration.
    ///
    /// This error is returned when there are issues with the configuration file,
    /// such as missing files, invalid values, or unknown variable classes.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to load a file from the filesystem.
    #[error("Failed to load file.")]
    LoadFile(#[source] io::Error),

    /// Failed to parse a TOML variables file.
    #[error("Failed to parse TOML file.")]
    ParseTomlFile(#[source] toml::de::Error),

    /// Failed to parse a JSON variables file.
    #[error("Failed to parse JSON file.")]
    ParseJsonFile(#[source] serde_json::Error),

    /// The prompt engine rejected the input.
    #[error(transparent)]
    Engine(#[from] prompt_engine::Error),

    /// Failed to write command output.
    #[error("Failed to write output: {0}")]
    Output(String),
}

impl From<prompt_engine::ValidationError> for Error {
    fn from(e: prompt_engine::ValidationError) -> Self {
        Error::Engine(e.into())
    }
}
