//! Variable resolution with nested reference expansion.
//!
//! A variable's value may itself contain `{other}` references. Resolution
//! expands them depth-first with an explicit frame stack instead of
//! recursion, so the depth of a reference chain is bounded only by the
//! number of distinct variables. A name that is already on the stack is a
//! cycle.

use crate::engine::SubstitutionMode;
use crate::errors::{Error, TemplateError, ValidationError};
use crate::variable_key::VariableKeyValidator;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// A `{name}` reference inside a variable value. Hyphens are matched so that
/// a hyphenated name gets its dedicated error; any other brace text, such as
/// `{0}`, `{x:?}` or a conditional tag, is literal.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z][A-Za-z0-9_-]*)\}").expect("reference pattern is a valid regex")
});

/// A `{name}` occurrence inside a raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    span: Range<usize>,
    name: String,
}

/// One variable whose references are being expanded.
#[derive(Debug)]
struct Frame {
    name: String,
    raw: String,
    references: Vec<Reference>,
    values: Vec<String>,
}

impl Frame {
    fn pending_reference(&self) -> Option<&str> {
        self.references
            .get(self.values.len())
            .map(|reference| reference.name.as_str())
    }

    /// Splices resolved values into the raw text. Only the `{name}` span is
    /// replaced, so surrounding whitespace is kept as written.
    fn expand(&self) -> String {
        let mut expanded = String::with_capacity(self.raw.len());
        let mut cursor = 0;

        for (reference, value) in self.references.iter().zip(&self.values) {
            expanded.push_str(&self.raw[cursor..reference.span.start]);
            expanded.push_str(value);
            cursor = reference.span.end;
        }
        expanded.push_str(&self.raw[cursor..]);

        expanded
    }
}

enum Step {
    Resolved(String),
    Expand(Frame),
}

/// Resolves variable values for a single substitution call.
///
/// The resolver borrows the call's variable map and owns its cache, so a
/// new resolver is created per call and nothing is shared between
/// concurrent calls.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::{SubstitutionMode, VariableKeyValidator, VariableResolver};
/// use std::collections::HashMap;
///
/// let variables = HashMap::from([
///     ("greeting".to_string(), "Hello {name}".to_string()),
///     ("name".to_string(), "John".to_string()),
/// ]);
/// let keys = VariableKeyValidator::new();
/// let mut resolver = VariableResolver::new(&variables, &keys, SubstitutionMode::Tolerant);
///
/// assert_eq!(resolver.resolve_variable("greeting").unwrap(), "Hello John");
/// ```
#[derive(Debug)]
pub struct VariableResolver<'a> {
    variables: &'a HashMap<String, String>,
    key_validator: &'a VariableKeyValidator,
    mode: SubstitutionMode,
    resolved: HashMap<String, String>,
}

impl<'a> VariableResolver<'a> {
    pub fn new(
        variables: &'a HashMap<String, String>,
        key_validator: &'a VariableKeyValidator,
        mode: SubstitutionMode,
    ) -> Self {
        Self {
            variables,
            key_validator,
            mode,
            resolved: HashMap::new(),
        }
    }

    /// Resolves `name` to its fully expanded value.
    ///
    /// Absent variables resolve to an empty string in tolerant mode and fail
    /// in strict mode.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a malformed name anywhere in the chain, or a
    ///   missing variable in strict mode
    /// - `TemplateError::CircularReference` when the chain revisits a name
    pub fn resolve_variable(&mut self, name: &str) -> Result<String, Error> {
        self.resolve_with_path(name, &HashSet::new())
    }

    /// Resolves `name` as if the names in `visited` were already being
    /// expanded further up the chain.
    pub fn resolve_with_path(
        &mut self,
        name: &str,
        visited: &HashSet<String>,
    ) -> Result<String, Error> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut result = String::new();

        match self.enter(name, visited, &stack)? {
            Step::Resolved(value) => return Ok(value),
            Step::Expand(frame) => stack.push(frame),
        }

        while let Some(frame) = stack.last_mut() {
            if let Some(reference) = frame.pending_reference() {
                let reference = reference.to_string();
                match self.enter(&reference, visited, &stack)? {
                    Step::Resolved(value) => {
                        if let Some(frame) = stack.last_mut() {
                            frame.values.push(value);
                        }
                    }
                    Step::Expand(child) => stack.push(child),
                }
                continue;
            }

            let Some(finished) = stack.pop() else {
                break;
            };
            let value = finished.expand();
            debug!("Resolved variable {}", finished.name);
            self.resolved.insert(finished.name, value.clone());

            match stack.last_mut() {
                Some(parent) => parent.values.push(value),
                None => result = value,
            }
        }

        Ok(result)
    }

    fn enter(
        &mut self,
        name: &str,
        visited: &HashSet<String>,
        stack: &[Frame],
    ) -> Result<Step, Error> {
        self.key_validator.validate_key(name)?;

        if visited.contains(name) || stack.iter().any(|frame| frame.name == name) {
            let chain = stack
                .iter()
                .map(|frame| frame.name.clone())
                .chain(std::iter::once(name.to_string()))
                .collect();
            return Err(TemplateError::CircularReference { chain }.into());
        }

        if let Some(value) = self.resolved.get(name) {
            return Ok(Step::Resolved(value.clone()));
        }

        let Some(raw) = self.variables.get(name) else {
            return match self.mode {
                SubstitutionMode::Tolerant => {
                    debug!("Variable {} is not set, resolving to empty", name);
                    Ok(Step::Resolved(String::new()))
                }
                SubstitutionMode::Strict => Err(ValidationError::MissingRequiredVariable {
                    name: name.to_string(),
                }
                .into()),
            };
        };

        let references = find_references(raw);
        if references.is_empty() {
            self.resolved.insert(name.to_string(), raw.clone());
            return Ok(Step::Resolved(raw.clone()));
        }

        Ok(Step::Expand(Frame {
            name: name.to_string(),
            raw: raw.clone(),
            references,
            values: Vec::new(),
        }))
    }
}

fn find_references(value: &str) -> Vec<Reference> {
    REFERENCE_PATTERN
        .captures_iter(value)
        .filter_map(|captures| {
            Some(Reference {
                span: captures.get(0)?.range(),
                name: captures.get(1)?.as_str().to_string(),
            })
        })
        .collect()
}
