//! Variable name validation.

use crate::errors::ValidationError;
use crate::reserved::ReservedVariables;

#[cfg(test)]
#[path = "variable_key_tests.rs"]
mod tests;

/// Validates variable names.
///
/// A variable name must start with an ASCII letter followed by ASCII
/// letters, digits or underscores (`^[a-zA-Z][a-zA-Z0-9_]*$`). Hyphens get
/// a dedicated error because `kebab-case` names are the most common
/// mistake. In reserved-only mode the name must additionally be in the
/// reserved registry.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::{ReservedVariables, VariableKeyValidator};
///
/// let validator = VariableKeyValidator::new();
/// assert!(validator.validate_key("project_name").is_ok());
/// assert!(validator.validate_key("1st_value").is_err());
///
/// let strict = VariableKeyValidator::reserved_only(ReservedVariables::default());
/// assert!(strict.validate_key("schema_file").is_ok());
/// assert!(strict.validate_key("project_name").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableKeyValidator {
    reserved: Option<ReservedVariables>,
}

impl VariableKeyValidator {
    /// Creates a validator that only checks name syntax.
    pub fn new() -> Self {
        Self { reserved: None }
    }

    /// Creates a validator that also requires names to be in `reserved`.
    pub fn reserved_only(reserved: ReservedVariables) -> Self {
        Self {
            reserved: Some(reserved),
        }
    }

    /// Checks a single variable name.
    ///
    /// # Errors
    ///
    /// - `ValidationError::HyphenatedVariableName` if the name is malformed
    ///   and contains a hyphen
    /// - `ValidationError::InvalidVariableName` for any other syntax error
    /// - `ValidationError::NonReservedVariable` in reserved-only mode when
    ///   the name is not registered
    pub fn validate_key(&self, name: &str) -> Result<(), ValidationError> {
        if !is_identifier(name) {
            if name.contains('-') {
                return Err(ValidationError::HyphenatedVariableName {
                    name: name.to_string(),
                });
            }
            return Err(ValidationError::InvalidVariableName {
                name: name.to_string(),
            });
        }

        if let Some(reserved) = &self.reserved {
            if !reserved.contains(name) {
                return Err(ValidationError::NonReservedVariable {
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Returns true when `name` matches `^[a-zA-Z][a-zA-Z0-9_]*$`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
