//! Reserved variable registry and value classification.
//!
//! Every variable is classified once into a [`VariableClass`]. The class
//! decides which validator checks the value, whether an empty value is
//! allowed, and whether the value is HTML-escaped on substitution.

use crate::errors::ValidationError;
use crate::path_validator::PathKind;
use crate::variable_key::VariableKeyValidator;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "reserved_tests.rs"]
mod tests;

/// Scalar kinds a typed reserved variable can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Date,
    Time,
    Timestamp,
}

impl ValueKind {
    /// Validates `raw` for this kind and returns its canonical text form.
    ///
    /// Numbers keep integer form when they parse as one, booleans are
    /// lowercased, dates use `%Y-%m-%d`, times `%H:%M:%S` and timestamps
    /// RFC 3339.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use prompt_engine::ValueKind;
    ///
    /// assert_eq!(ValueKind::Boolean.convert("TRUE").unwrap(), "true");
    /// assert_eq!(ValueKind::Number.convert(" 42 ").unwrap(), "42");
    /// assert!(ValueKind::Date.convert("2024-13-01").is_err());
    /// ```
    pub fn convert(&self, raw: &str) -> Result<String, ValidationError> {
        let value = raw.trim();
        let invalid = || ValidationError::InvalidTypedValue {
            kind: *self,
            value: raw.to_string(),
        };

        match self {
            ValueKind::String => Ok(raw.to_string()),
            ValueKind::Number => {
                if let Ok(integer) = value.parse::<i64>() {
                    return Ok(integer.to_string());
                }
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .map(|number| number.to_string())
                    .ok_or_else(invalid)
            }
            ValueKind::Boolean => match value.to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err(invalid()),
            },
            ValueKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|date| date.format("%Y-%m-%d").to_string())
                .map_err(|_| invalid()),
            ValueKind::Time => NaiveTime::parse_from_str(value, "%H:%M:%S")
                .map(|time| time.format("%H:%M:%S").to_string())
                .map_err(|_| invalid()),
            ValueKind::Timestamp => DateTime::parse_from_rfc3339(value)
                .map(|timestamp| timestamp.to_rfc3339())
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// How a variable's value is validated and substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableClass {
    /// A file or directory path, checked by `PathValidator`.
    Path(PathKind),
    /// Raw Markdown, checked by `TextValidator` and never escaped.
    Markdown,
    /// Free text, HTML-escaped on substitution when escaping is enabled.
    Text,
    /// A scalar converted through [`ValueKind::convert`].
    Typed(ValueKind),
}

impl VariableClass {
    /// Infers the class of a non-reserved variable from its name.
    ///
    /// Names ending in `_file` or `_path` are file paths, `_dir` marks a
    /// directory, and names containing `markdown` or ending in `_md` hold
    /// Markdown. Everything else is plain text.
    pub fn infer(name: &str) -> Self {
        if name.ends_with("_file") || name.ends_with("_path") {
            VariableClass::Path(PathKind::File)
        } else if name.ends_with("_dir") {
            VariableClass::Path(PathKind::Directory)
        } else if name.contains("markdown") || name.ends_with("_md") {
            VariableClass::Markdown
        } else {
            VariableClass::Text
        }
    }

    /// Whether values of this class are escaped before substitution.
    pub fn is_escaped(&self) -> bool {
        matches!(self, VariableClass::Text | VariableClass::Typed(ValueKind::String))
    }
}

impl FromStr for VariableClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(VariableClass::Path(PathKind::File)),
            "directory" | "dir" => Ok(VariableClass::Path(PathKind::Directory)),
            "markdown" => Ok(VariableClass::Markdown),
            "text" => Ok(VariableClass::Text),
            "string" => Ok(VariableClass::Typed(ValueKind::String)),
            "number" => Ok(VariableClass::Typed(ValueKind::Number)),
            "boolean" | "bool" => Ok(VariableClass::Typed(ValueKind::Boolean)),
            "date" => Ok(VariableClass::Typed(ValueKind::Date)),
            "time" => Ok(VariableClass::Typed(ValueKind::Time)),
            "timestamp" => Ok(VariableClass::Typed(ValueKind::Timestamp)),
            other => Err(format!("unknown variable class `{}`", other)),
        }
    }
}

impl fmt::Display for VariableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableClass::Path(PathKind::File) => f.write_str("file"),
            VariableClass::Path(PathKind::Directory) => f.write_str("directory"),
            VariableClass::Markdown => f.write_str("markdown"),
            VariableClass::Text => f.write_str("text"),
            VariableClass::Typed(kind) => write!(f, "{}", kind),
        }
    }
}

/// Closed registry of reserved variable names.
///
/// Reserved variables may be supplied empty (they are then treated as
/// absent), and in reserved-only mode they are the only names accepted.
/// The registry is plain configuration: callers start from one of the
/// presets and [`register`](Self::register) whatever else they need.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::{PathKind, ReservedVariables, VariableClass};
///
/// let mut reserved = ReservedVariables::default();
/// assert!(reserved.contains("schema_file"));
/// assert!(!reserved.contains("input_text"));
///
/// reserved.register("build_date", "date".parse().unwrap()).unwrap();
/// assert_eq!(
///     reserved.classify("output_dir"),
///     VariableClass::Path(PathKind::Directory)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedVariables {
    entries: BTreeMap<String, VariableClass>,
}

impl ReservedVariables {
    /// Creates a registry with no reserved names.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The core registry plus the input/destination names used by prompt
    /// generation commands.
    pub fn extended() -> Self {
        let mut registry = Self::default();
        let extra = [
            ("input_text", VariableClass::Text),
            ("input_text_file", VariableClass::Path(PathKind::File)),
            ("destination_path", VariableClass::Path(PathKind::File)),
            ("input_markdown", VariableClass::Markdown),
            ("input_markdown_file", VariableClass::Path(PathKind::File)),
        ];
        for (name, class) in extra {
            registry.entries.insert(name.to_string(), class);
        }
        registry
    }

    /// Adds `name` to the registry, replacing any earlier class.
    ///
    /// # Errors
    ///
    /// Returns the key validator's error when `name` is not a valid
    /// variable name.
    pub fn register(
        &mut self,
        name: &str,
        class: VariableClass,
    ) -> Result<&mut Self, ValidationError> {
        VariableKeyValidator::new().validate_key(name)?;
        self.entries.insert(name.to_string(), class);
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<VariableClass> {
        self.entries.get(name).copied()
    }

    /// Reserved names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the registered class of `name`, or infers one from the name.
    pub fn classify(&self, name: &str) -> VariableClass {
        self.get(name).unwrap_or_else(|| VariableClass::infer(name))
    }
}

impl Default for ReservedVariables {
    fn default() -> Self {
        let entries = [
            ("schema_file", VariableClass::Path(PathKind::File)),
            ("template_path", VariableClass::Path(PathKind::File)),
            ("output_dir", VariableClass::Path(PathKind::Directory)),
            ("config_file", VariableClass::Path(PathKind::File)),
            ("prompt_file_path", VariableClass::Path(PathKind::File)),
        ]
        .into_iter()
        .map(|(name, class)| (name.to_string(), class))
        .collect();

        Self { entries }
    }
}

/// Generates the built-in date and time variables for `now`.
///
/// The engine merges these under user-supplied values when built-ins are
/// enabled, so a caller can always override them.
pub fn built_in_variables(now: DateTime<Utc>) -> HashMap<String, String> {
    let mut variables = HashMap::new();

    variables.insert(
        "current_date".to_string(),
        now.format("%Y-%m-%d").to_string(),
    );
    variables.insert(
        "current_time".to_string(),
        now.format("%H:%M:%S").to_string(),
    );
    variables.insert("timestamp".to_string(), now.to_rfc3339());
    variables.insert("timestamp_unix".to_string(), now.timestamp().to_string());

    variables
}
