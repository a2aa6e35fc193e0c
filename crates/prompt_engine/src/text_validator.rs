//! Free-text and Markdown value validation.

use crate::errors::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

#[cfg(test)]
#[path = "text_validator_tests.rs"]
mod tests;

/// Recognizable light-markup elements: heading, list item, blockquote,
/// inline code or fence, emphasis, and inline link.
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s{0,3}#{1,6}(\s|$)|^\s*([-*+]|\d+[.)])\s+\S|^\s{0,3}>|`|\*\*?[^*\s][^*]*?\*|(^|[^\w])__?[^_\s][^_]*?_|\[[^\]]+\]\([^)\s]+\)",
    )
    .expect("markup pattern is a valid regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+").expect("list marker pattern is a valid regex"));

static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s{0,3}(([*]\s*){3,}|([-]\s*){3,}|([_]\s*){3,})$")
        .expect("thematic break pattern is a valid regex")
});

/// Validates text values.
///
/// Text that contains Markdown must be well formed: emphasis markers and
/// backticks pair up on every line and every code fence is closed. Plain
/// text only has to be non-empty, unless the validator is strict, which
/// requires at least one Markdown element.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::TextValidator;
///
/// assert!(TextValidator::new().validate_text("plain words").is_ok());
/// assert!(TextValidator::new().validate_text("run `cargo").is_err());
///
/// let strict = TextValidator::strict();
/// assert!(strict.validate_text("# Title\n\nSome *emphasis*.").is_ok());
/// assert!(strict.validate_text("plain words").is_err());
/// assert!(strict.validate_text("# Title\n\nbroken *emphasis").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextValidator {
    strict: bool,
}

impl TextValidator {
    /// Creates a validator that accepts plain text.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Creates a validator that requires well-formed Markdown.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Checks `text`.
    ///
    /// # Errors
    ///
    /// - `ValidationError::EmptyText` for empty or whitespace-only text
    /// - `ValidationError::MissingMarkup` (strict) when no Markdown element
    ///   is present
    /// - `ValidationError::UnbalancedMarkup` with the 1-based line of the
    ///   first unpaired `*`, `_` or backtick
    /// - `ValidationError::UnterminatedCodeFence` with the line of the
    ///   unclosed fence
    pub fn validate_text(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        if !has_markdown(text) {
            return if self.strict {
                Err(ValidationError::MissingMarkup)
            } else {
                Ok(())
            };
        }

        check_balance(text)
    }
}

/// Whether `text` contains at least one recognizable Markdown element.
pub fn has_markdown(text: &str) -> bool {
    MARKUP_PATTERN.is_match(text)
}

fn check_balance(text: &str) -> Result<(), ValidationError> {
    let mut open_fence: Option<usize> = None;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;

        if line.trim_start().starts_with("```") {
            open_fence = match open_fence {
                Some(_) => None,
                None => Some(line_number),
            };
            continue;
        }

        if open_fence.is_some() || THEMATIC_BREAK.is_match(line) {
            continue;
        }

        let backticks = line.matches('`').count();
        if backticks % 2 != 0 {
            return Err(ValidationError::UnbalancedMarkup {
                marker: '`',
                line: line_number,
            });
        }

        let prose = strip_code_spans(&LIST_MARKER.replace(line, ""));

        if prose.matches('*').count() % 2 != 0 {
            return Err(ValidationError::UnbalancedMarkup {
                marker: '*',
                line: line_number,
            });
        }

        if emphasis_underscores(&prose) % 2 != 0 {
            return Err(ValidationError::UnbalancedMarkup {
                marker: '_',
                line: line_number,
            });
        }
    }

    match open_fence {
        Some(line) => Err(ValidationError::UnterminatedCodeFence { line }),
        None => Ok(()),
    }
}

/// Removes the contents of inline code spans so markers inside them are not
/// counted.
fn strip_code_spans(line: &str) -> String {
    line.split('`')
        .enumerate()
        .filter(|(index, _)| index % 2 == 0)
        .map(|(_, part)| part)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Counts underscores that can open or close emphasis, skipping intraword
/// ones such as the underscores in `snake_case_name`.
fn emphasis_underscores(line: &str) -> usize {
    let chars: Vec<char> = line.chars().collect();

    (0..chars.len())
        .filter(|&i| chars[i] == '_')
        .filter(|&i| {
            let before = i.checked_sub(1).map(|j| chars[j]);
            let after = chars.get(i + 1).copied();
            let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric());
            !(is_word(before) && is_word(after))
        })
        .count()
}
