//! Error types for prompt template processing.
//!
//! There are two core error kinds: [`ValidationError`] for malformed input
//! (names, paths, text, missing or mistyped values) and [`TemplateError`]
//! for structural template problems. [`FileError`] is reserved for the file
//! collaborators and never produced by validation or substitution.

use crate::reserved::ValueKind;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Input validation failures.
///
/// Every validator fails fast with the first violated rule, so a single
/// call never reports more than one of these.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::{ValidationError, VariableKeyValidator};
///
/// let validator = VariableKeyValidator::new();
/// match validator.validate_key("invalid-name") {
///     Err(ValidationError::HyphenatedVariableName { name }) => {
///         assert_eq!(name, "invalid-name");
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The path was empty or contained only whitespace.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// The path contained a NUL character.
    #[error("Path contains null byte")]
    NullByte,

    /// The path contained a reserved character or whitespace.
    #[error("Path contains invalid character {character:?}")]
    InvalidPathCharacter {
        /// The first offending character found
        character: char,
    },

    /// The path is longer than the platform-independent limit.
    #[error("Path exceeds maximum length of {max} characters ({length})")]
    PathTooLong {
        /// Length of the rejected path
        length: usize,
        /// Maximum permitted length
        max: usize,
    },

    /// The path contained a `.` or `..` component.
    #[error("Path traversal is not allowed: {path}")]
    PathTraversal {
        /// The rejected path
        path: String,
    },

    /// An absolute directory path outside every allowed root.
    #[error("Absolute paths are not allowed. Please use relative paths instead.")]
    AbsolutePathNotAllowed {
        /// The rejected path
        path: String,
    },

    /// An absolute file path outside every allowed root.
    #[error("Path is not allowed: {path}")]
    PathNotAllowed {
        /// The rejected path
        path: String,
    },

    /// The normalized path contained characters outside `[a-zA-Z0-9/-_.]`.
    #[error("Path contains characters outside the allowed set: {path}")]
    InvalidNormalizedPath {
        /// The normalized path
        path: String,
    },

    /// A directory path whose final segment looks like a file name.
    #[error("Directory path appears to reference a file: {path}")]
    NotADirectory {
        /// The rejected path
        path: String,
    },

    /// A directory path without a trailing slash, when one is required.
    #[error("Directory path must end with '/': {path}")]
    MissingTrailingSlash {
        /// The rejected path
        path: String,
    },

    /// The variable name does not match `^[a-zA-Z][a-zA-Z0-9_]*$`.
    #[error("Invalid variable name: `{name}` - variable names must start with a letter and contain only letters, digits, and underscores")]
    InvalidVariableName {
        /// The rejected name
        name: String,
    },

    /// The variable name contains a hyphen.
    #[error("Invalid variable name: `{name}` - variable names cannot contain hyphens")]
    HyphenatedVariableName {
        /// The rejected name
        name: String,
    },

    /// The variable name is valid but not part of the reserved registry.
    #[error("Non-reserved variable not allowed: `{name}`")]
    NonReservedVariable {
        /// The rejected name
        name: String,
    },

    /// Text was empty or whitespace only.
    #[error("Text cannot be empty")]
    EmptyText,

    /// Strict text validation found no Markdown element.
    #[error("Text does not contain any Markdown formatting")]
    MissingMarkup,

    /// An emphasis or inline-code marker has no partner on its line.
    #[error("Unbalanced '{marker}' on line {line}")]
    UnbalancedMarkup {
        /// The marker character (`*`, `_` or a backtick)
        marker: char,
        /// 1-based line number
        line: usize,
    },

    /// A code fence was opened and never closed.
    #[error("Unterminated code fence starting on line {line}")]
    UnterminatedCodeFence {
        /// 1-based line number of the opening fence
        line: usize,
    },

    /// A referenced variable has no value in strict mode.
    #[error("Missing required variable: {name}")]
    MissingRequiredVariable {
        /// Name of the missing variable
        name: String,
    },

    /// One or more template placeholders have no value in strict mode.
    #[error("Missing required variables: {}", names.join(", "))]
    MissingRequiredVariables {
        /// Names of the missing variables, in template order
        names: Vec<String>,
    },

    /// A variable that requires a value was supplied as an empty string.
    #[error("Variable `{name}` cannot be empty")]
    EmptyValue {
        /// Name of the variable
        name: String,
    },

    /// A variable value was not a string.
    #[error("Variable `{name}` must be a string, found {found}")]
    NonStringValue {
        /// Name of the variable
        name: String,
        /// JSON type of the supplied value
        found: String,
    },

    /// A typed reserved value could not be converted.
    #[error("Invalid {kind} value: {value}")]
    InvalidTypedValue {
        /// Expected value kind
        kind: ValueKind,
        /// The raw value
        value: String,
    },

    /// A variable value failed its class-specific validation.
    #[error("Invalid value for variable `{name}`: {source}")]
    InvalidVariableValue {
        /// Name of the variable
        name: String,
        /// The underlying validation failure
        source: Box<ValidationError>,
    },
}

/// Structural template failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template was empty or whitespace only.
    #[error("Template is empty")]
    Empty,

    /// Template content exceeded the configured size limit.
    #[error("Template size {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Template size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Variable values reference each other in a loop.
    #[error("Circular variable reference detected: {}", chain.join(" -> "))]
    CircularReference {
        /// Resolution chain, ending with the repeated name
        chain: Vec<String>,
    },

    /// A `{#if name}` block has no closing `{/if}`.
    #[error("Unclosed conditional block: {{#if {condition}}} has no matching {{/if}}")]
    UnclosedConditional {
        /// Condition variable of the unclosed block
        condition: String,
    },

    /// A `{#if}` block appears inside another one.
    #[error("Nested conditional blocks are not supported: found inside {{#if {condition}}}")]
    NestedConditional {
        /// Condition variable of the enclosing block
        condition: String,
    },
}

/// Failures of the text file collaborators.
#[derive(Error, Debug)]
pub enum FileError {
    /// The file does not exist.
    #[error("File not found: {path}")]
    NotFound {
        /// Path that was requested
        path: String,
    },

    /// File content contains invalid UTF-8 sequences.
    #[error("Invalid UTF-8 content in file: {path}")]
    InvalidUtf8 {
        /// Path that was read
        path: String,
    },

    /// Reading failed for any other reason.
    #[error("Failed to read file: {path}")]
    Read {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing failed.
    #[error("Failed to write file: {path}")]
    Write {
        /// Path that was written
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Any failure produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    File(#[from] FileError),
}

/// Result type alias for prompt engine operations.
pub type PromptResult<T> = Result<T, Error>;
