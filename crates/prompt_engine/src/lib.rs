//! Prompt Engine for PromptRoller
//!
//! This crate turns prompt templates with `{name}` placeholders and
//! `{#if name}...{/if}` blocks into final prompt text. Every supplied
//! variable is validated before substitution: names against the identifier
//! rules, paths against traversal and absolute-path rules, and Markdown
//! values for balanced markup. Variable values may reference other
//! variables, which are expanded with cycle detection.
//!
//! The main entry point is [`TemplateEngine::generate`], which always
//! returns a [`GenerationReport`] describing the outcome.
//!
//! ```rust
//! use prompt_engine::{TemplateEngine, Variables};
//!
//! let engine = TemplateEngine::new();
//! let mut variables = Variables::new();
//! variables.insert("name", "John");
//!
//! let report = engine.generate("Hello {name}{#if task}, your task is {task}{/if}", &variables);
//! assert_eq!(report.content.as_deref(), Some("Hello John"));
//! assert_eq!(report.variables.remaining, vec!["task"]);
//! ```

mod engine;
mod errors;
mod files;
mod path_validator;
mod reserved;
mod resolver;
mod text_validator;
mod variable_key;
mod variables;

pub use engine::{EngineConfig, GenerationReport, SubstitutionMode, TemplateEngine, VariableReport};
pub use errors::{Error, FileError, PromptResult, TemplateError, ValidationError};
pub use files::{normalize_line_endings, FsTextFileStore, TextFileStore};
pub use path_validator::{NormalizedPath, PathKind, PathValidator, MAX_PATH_LENGTH};
pub use reserved::{built_in_variables, ReservedVariables, ValueKind, VariableClass};
pub use resolver::VariableResolver;
pub use text_validator::{has_markdown, TextValidator};
pub use variable_key::VariableKeyValidator;
pub use variables::Variables;
