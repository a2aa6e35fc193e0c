//! # Prompt Template Engine
//!
//! Substitutes `{name}` placeholders in prompt templates. A generation call
//! runs through a fixed sequence of stages:
//!
//! 1. **Extract**: evaluate `{#if name}...{/if}` blocks and collect the
//!    distinct placeholder names in order of appearance
//! 2. **Validate**: check every supplied variable name and value against
//!    its class (path, Markdown, text or typed)
//! 3. **Resolve**: expand `{other}` references inside values
//! 4. **Substitute**: replace each placeholder that has a value, leaving the
//!    rest verbatim (tolerant mode) or failing (strict mode)
//!
//! Failures at any stage are reported in the returned [`GenerationReport`]
//! rather than as an `Err`, together with the placeholders detected so far.
//!
//! ## Examples
//!
//! ```rust
//! use prompt_engine::{TemplateEngine, Variables};
//!
//! let engine = TemplateEngine::new();
//! let variables: Variables = [("name", "John"), ("task", "Code Review")]
//!     .into_iter()
//!     .collect();
//!
//! let report = engine.generate("Hello {name}, your task is {task}", &variables);
//! assert!(report.success);
//! assert_eq!(
//!     report.content.as_deref(),
//!     Some("Hello John, your task is Code Review")
//! );
//! assert_eq!(report.variables.replaced, vec!["name", "task"]);
//! ```

use crate::errors::{Error, TemplateError, ValidationError};
use crate::files::TextFileStore;
use crate::path_validator::{PathKind, PathValidator};
use crate::reserved::{built_in_variables, ReservedVariables, VariableClass};
use crate::resolver::VariableResolver;
use crate::text_validator::TextValidator;
use crate::variable_key::VariableKeyValidator;
use crate::variables::{json_type_name, Variables};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// A `{name}` placeholder in a template.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("placeholder pattern is a valid regex")
});

/// The opening tag of a conditional block.
static CONDITIONAL_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{#if\s+([^{}]*?)\s*\}").expect("conditional pattern is a valid regex")
});

const CONDITIONAL_CLOSE: &str = "{/if}";

/// What happens to placeholders that have no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// Leave unmatched placeholders verbatim and report them as remaining.
    #[default]
    Tolerant,
    /// Fail the whole call if any placeholder has no value.
    Strict,
}

/// Configuration for template generation behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Missing-variable policy.
    ///
    /// **Default**: `Tolerant`
    pub mode: SubstitutionMode,

    /// Whether text values are HTML-escaped on substitution. Markdown and
    /// path values are never escaped.
    ///
    /// **Default**: `true`
    pub escape_html: bool,

    /// Whether Markdown values must contain well-formed Markdown.
    ///
    /// **Default**: `false`
    pub strict_markdown: bool,

    /// Whether only reserved variable names are accepted.
    ///
    /// **Default**: `false`
    pub reserved_only: bool,

    /// Whether `current_date`, `current_time`, `timestamp` and
    /// `timestamp_unix` are provided when the caller does not set them.
    ///
    /// **Default**: `false`
    pub built_ins: bool,

    /// Maximum template size in bytes.
    ///
    /// **Default**: 1MB (1,048,576 bytes)
    pub max_template_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: SubstitutionMode::Tolerant,
            escape_html: true,
            strict_markdown: false,
            reserved_only: false,
            built_ins: false,
            max_template_size: 1_048_576, // 1MB
        }
    }
}

/// Placeholder names grouped by outcome.
///
/// Every detected name is in exactly one of `replaced` or `remaining`.
/// A `{#if name}` condition with a value is consumed by evaluating it, so it
/// is reported as replaced even when its block was dropped. A condition
/// without a value is remaining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableReport {
    /// All placeholder and condition names, in order of first appearance.
    pub detected: Vec<String>,
    /// Placeholders that were substituted and conditions that were evaluated
    /// against a value.
    pub replaced: Vec<String>,
    /// Names without a value, left as literal placeholders.
    pub remaining: Vec<String>,
}

/// Outcome of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub success: bool,

    /// Substituted text, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Human-readable failure message, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub variables: VariableReport,
}

impl GenerationReport {
    fn succeeded(content: String, variables: VariableReport) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
            variables,
        }
    }

    fn failed(error: &Error, detected: Vec<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.to_string()),
            variables: VariableReport {
                detected,
                ..Default::default()
            },
        }
    }
}

/// A template after conditional evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTemplate {
    text: String,
    detected: Vec<String>,
}

/// Prompt template engine.
///
/// The engine holds only configuration and validators. Each call builds its
/// own resolver and cache, so one engine can serve concurrent calls; the
/// path allow-list is the only shared state and it is lock-protected.
#[derive(Debug)]
pub struct TemplateEngine {
    config: EngineConfig,
    reserved: ReservedVariables,
    key_validator: VariableKeyValidator,
    path_validator: PathValidator,
    text_validator: TextValidator,
}

impl TemplateEngine {
    /// Creates an engine with the default configuration and the core
    /// reserved registry.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let reserved = ReservedVariables::default();
        let text_validator = if config.strict_markdown {
            TextValidator::strict()
        } else {
            TextValidator::new()
        };

        Self {
            key_validator: key_validator_for(&config, &reserved),
            reserved,
            path_validator: PathValidator::new(),
            text_validator,
            config,
        }
    }

    /// Replaces the reserved registry.
    pub fn with_reserved(mut self, reserved: ReservedVariables) -> Self {
        self.key_validator = key_validator_for(&self.config, &reserved);
        self.reserved = reserved;
        self
    }

    /// Replaces the path validator, for example one with a fixed set of
    /// temporary roots.
    pub fn with_path_validator(mut self, path_validator: PathValidator) -> Self {
        self.path_validator = path_validator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reserved(&self) -> &ReservedVariables {
        &self.reserved
    }

    /// The path validator, e.g. to [`allow_prefix`](PathValidator::allow_prefix).
    pub fn path_validator(&self) -> &PathValidator {
        &self.path_validator
    }

    /// Lists every placeholder and condition name in `template`, including
    /// those inside conditional bodies, without substituting anything.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` for unclosed or nested conditional blocks and
    /// `ValidationError` for an invalid condition name.
    pub fn extract_variables(&self, template: &str) -> Result<Vec<String>, Error> {
        Ok(self.parse(template, |_| true)?.detected)
    }

    /// Generates text from `template` and `variables`.
    ///
    /// Never returns an error: failures are reported through
    /// [`GenerationReport::error`] with `success == false`.
    #[instrument(
        skip(self, template, variables),
        fields(template_bytes = template.len(), variable_count = variables.len())
    )]
    pub fn generate(&self, template: &str, variables: &Variables) -> GenerationReport {
        let mut detected = Vec::new();

        match self.run(template, variables, &mut detected) {
            Ok((content, report)) => {
                info!(
                    "Generated prompt: {} replaced, {} remaining",
                    report.replaced.len(),
                    report.remaining.len()
                );
                GenerationReport::succeeded(content, report)
            }
            Err(e) => {
                warn!("Prompt generation failed: {}", e);
                GenerationReport::failed(&e, detected)
            }
        }
    }

    /// Reads the template at `template_path` through `store` and generates
    /// from it. The path is validated as a file path first.
    #[instrument(skip(self, store, variables))]
    pub async fn generate_from_file(
        &self,
        store: &dyn TextFileStore,
        template_path: &str,
        variables: &Variables,
    ) -> GenerationReport {
        match self.load_template(store, template_path).await {
            Ok(template) => self.generate(&template, variables),
            Err(e) => {
                warn!("Failed to load template {}: {}", template_path, e);
                GenerationReport::failed(&e, Vec::new())
            }
        }
    }

    /// Generates from the template at `template_path` and writes the result
    /// to `output_path`. Nothing is written when generation fails.
    #[instrument(skip(self, store, variables))]
    pub async fn render_to_file(
        &self,
        store: &dyn TextFileStore,
        template_path: &str,
        output_path: &str,
        variables: &Variables,
    ) -> GenerationReport {
        let output = match self.path_validator.validate_path(output_path, PathKind::File) {
            Ok(output) => output,
            Err(e) => return GenerationReport::failed(&e.into(), Vec::new()),
        };

        let report = self.generate_from_file(store, template_path, variables).await;
        let Some(content) = report.content.as_deref().filter(|_| report.success) else {
            return report;
        };

        match store.write_text_file(output.as_path(), content).await {
            Ok(()) => {
                info!("Wrote generated prompt to {}", output);
                report
            }
            Err(e) => GenerationReport::failed(&e.into(), report.variables.detected),
        }
    }

    async fn load_template(
        &self,
        store: &dyn TextFileStore,
        template_path: &str,
    ) -> Result<String, Error> {
        let path = self
            .path_validator
            .validate_path(template_path, PathKind::File)?;
        Ok(store.read_text_file(path.as_path()).await?)
    }

    fn run(
        &self,
        template: &str,
        variables: &Variables,
        detected: &mut Vec<String>,
    ) -> Result<(String, VariableReport), Error> {
        if template.trim().is_empty() {
            return Err(TemplateError::Empty.into());
        }

        if template.len() > self.config.max_template_size {
            return Err(TemplateError::TooLarge {
                size: template.len(),
                limit: self.config.max_template_size,
            }
            .into());
        }

        let parsed = self.parse(template, |condition| {
            variables.get_str(condition) == Some("true")
        })?;
        detected.clone_from(&parsed.detected);
        debug!("Detected placeholders: {:?}", parsed.detected);

        if parsed.detected.is_empty() {
            return Ok((parsed.text, VariableReport::default()));
        }

        let mut values = self.validate_variables(variables)?;
        if self.config.built_ins {
            for (name, value) in built_in_variables(chrono::Utc::now()) {
                values.entry(name).or_insert(value);
            }
        }

        let missing: Vec<String> = parsed
            .detected
            .iter()
            .filter(|name| !values.contains_key(*name))
            .cloned()
            .collect();
        if self.config.mode == SubstitutionMode::Strict && !missing.is_empty() {
            return Err(ValidationError::MissingRequiredVariables { names: missing }.into());
        }

        let mut resolver = VariableResolver::new(&values, &self.key_validator, self.config.mode);
        let mut replacements: HashMap<&str, String> = HashMap::new();
        let mut replaced = Vec::new();

        for name in parsed.detected.iter().filter(|name| values.contains_key(*name)) {
            let value = resolver.resolve_variable(name)?;
            let value = if self.config.escape_html && self.reserved.classify(name).is_escaped() {
                html_escape::encode_quoted_attribute(&value).into_owned()
            } else {
                value
            };
            replacements.insert(name.as_str(), value);
            replaced.push(name.clone());
        }

        let content = PLACEHOLDER_PATTERN
            .replace_all(&parsed.text, |captures: &Captures| {
                match replacements.get(&captures[1]) {
                    Some(value) => value.clone(),
                    None => captures[0].to_string(),
                }
            })
            .into_owned();

        Ok((
            content,
            VariableReport {
                detected: parsed.detected,
                replaced,
                remaining: missing,
            },
        ))
    }

    /// Validates every supplied variable and returns the values to
    /// substitute, keyed by name.
    ///
    /// Path values are replaced by their normalized form and typed values
    /// by their canonical form. Empty reserved variables are dropped, which
    /// makes them behave as absent; any other empty value is an error.
    fn validate_variables(
        &self,
        variables: &Variables,
    ) -> Result<HashMap<String, String>, ValidationError> {
        let mut values = HashMap::with_capacity(variables.len());

        for (name, value) in variables.iter() {
            self.key_validator.validate_key(name)?;

            let raw = value
                .as_str()
                .ok_or_else(|| ValidationError::NonStringValue {
                    name: name.to_string(),
                    found: json_type_name(value).to_string(),
                })?;

            if raw.trim().is_empty() {
                if self.reserved.contains(name) {
                    debug!("Reserved variable {} is empty, treating as absent", name);
                    continue;
                }
                return Err(ValidationError::EmptyValue {
                    name: name.to_string(),
                });
            }

            let checked = match self.reserved.classify(name) {
                VariableClass::Path(kind) => self
                    .path_validator
                    .validate_path(raw, kind)
                    .map(String::from),
                VariableClass::Markdown => self
                    .text_validator
                    .validate_text(raw)
                    .map(|_| raw.to_string()),
                VariableClass::Text => Ok(raw.to_string()),
                VariableClass::Typed(kind) => kind.convert(raw),
            };

            let checked = checked.map_err(|source| ValidationError::InvalidVariableValue {
                name: name.to_string(),
                source: Box::new(source),
            })?;
            values.insert(name.to_string(), checked);
        }

        Ok(values)
    }

    /// Evaluates conditional blocks and collects placeholder names.
    ///
    /// `keep` decides, per condition name, whether a block's body is kept.
    /// Condition names are always detected; body placeholders only when the
    /// body is kept.
    fn parse(
        &self,
        template: &str,
        keep: impl Fn(&str) -> bool,
    ) -> Result<ParsedTemplate, Error> {
        let mut text = String::with_capacity(template.len());
        let mut detected = Vec::new();
        let mut rest = template;

        while let Some(open) = CONDITIONAL_OPEN.captures(rest) {
            let (Some(tag), Some(condition)) = (open.get(0), open.get(1)) else {
                break;
            };
            let condition = condition.as_str();

            let before = &rest[..tag.start()];
            collect_placeholders(before, &mut detected);
            text.push_str(before);

            self.key_validator.validate_key(condition)?;

            let after_open = &rest[tag.end()..];
            let Some(close) = after_open.find(CONDITIONAL_CLOSE) else {
                return Err(TemplateError::UnclosedConditional {
                    condition: condition.to_string(),
                }
                .into());
            };

            let body = &after_open[..close];
            if CONDITIONAL_OPEN.is_match(body) {
                return Err(TemplateError::NestedConditional {
                    condition: condition.to_string(),
                }
                .into());
            }

            push_unique(&mut detected, condition);
            if keep(condition) {
                collect_placeholders(body, &mut detected);
                text.push_str(body);
            } else {
                debug!("Dropping conditional block for {}", condition);
            }

            rest = &after_open[close + CONDITIONAL_CLOSE.len()..];
        }

        collect_placeholders(rest, &mut detected);
        text.push_str(rest);

        Ok(ParsedTemplate { text, detected })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn key_validator_for(config: &EngineConfig, reserved: &ReservedVariables) -> VariableKeyValidator {
    if config.reserved_only {
        VariableKeyValidator::reserved_only(reserved.clone())
    } else {
        VariableKeyValidator::new()
    }
}

fn collect_placeholders(text: &str, detected: &mut Vec<String>) {
    for captures in PLACEHOLDER_PATTERN.captures_iter(text) {
        push_unique(detected, &captures[1]);
    }
}

fn push_unique(detected: &mut Vec<String>, name: &str) {
    if !detected.iter().any(|existing| existing == name) {
        detected.push(name.to_string());
    }
}
