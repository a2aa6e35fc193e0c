//! File and directory path validation.
//!
//! Paths supplied as variable values end up in prompts that tools act on, so
//! they are held to a conservative rule set: no traversal, a restricted
//! character set, a length cap, and absolute paths only beneath the working
//! directory, the system temporary directory, or an explicitly allowed
//! prefix.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "path_validator_tests.rs"]
mod tests;

/// Maximum accepted path length in bytes.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Characters that are never accepted in a path, in addition to whitespace.
const INVALID_PATH_CHARACTERS: [char; 7] = ['<', '>', '"', '|', '?', '*', '\\'];

/// Temporary directory roots used when the probe cannot create a directory.
const FALLBACK_TEMP_ROOTS: [&str; 4] = ["/tmp", "/var/tmp", "/private/var/folders", "/var/folders"];

/// Whether a path names a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Directory,
}

/// A path that passed validation, in lexically normalized form.
///
/// Duplicate separators are collapsed. Directory paths keep a trailing `/`
/// when the input had one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NormalizedPath> for String {
    fn from(path: NormalizedPath) -> Self {
        path.0
    }
}

/// Validates and normalizes path strings.
///
/// The system temporary directory is probed once, when the validator is
/// constructed, by creating and deleting a scratch directory. If the probe
/// fails a fixed list of well-known roots is used instead. Additional
/// absolute prefixes can be allowed at any time through
/// [`allow_prefix`](Self::allow_prefix); the list only grows and is guarded
/// by a lock so a shared validator can be extended while in use.
///
/// # Examples
///
/// ```rust
/// use prompt_engine::{PathKind, PathValidator};
///
/// let validator = PathValidator::new();
///
/// let path = validator.validate_path("docs//guide.md", PathKind::File).unwrap();
/// assert_eq!(path.as_str(), "docs/guide.md");
///
/// assert!(validator.validate_path("../secrets.txt", PathKind::File).is_err());
/// assert!(validator.validate_path("/usr/local/test.md", PathKind::File).is_err());
///
/// validator.allow_prefix("/usr/local");
/// assert!(validator.validate_path("/usr/local/test.md", PathKind::File).is_ok());
/// ```
#[derive(Debug)]
pub struct PathValidator {
    temp_roots: Vec<PathBuf>,
    allowed_prefixes: RwLock<Vec<PathBuf>>,
    require_directory_slash: bool,
}

impl PathValidator {
    /// Creates a validator, probing the system for its temporary directory.
    pub fn new() -> Self {
        Self::with_temp_roots(detect_temp_roots())
    }

    /// Creates a validator with an explicit set of temporary roots and no
    /// probe.
    pub fn with_temp_roots(temp_roots: Vec<PathBuf>) -> Self {
        Self {
            temp_roots,
            allowed_prefixes: RwLock::new(Vec::new()),
            require_directory_slash: false,
        }
    }

    /// Requires directory paths to end with `/`.
    pub fn require_directory_trailing_slash(mut self, required: bool) -> Self {
        self.require_directory_slash = required;
        self
    }

    /// Allows absolute paths beneath `prefix`.
    pub fn allow_prefix(&self, prefix: impl AsRef<Path>) {
        let prefix = PathBuf::from(normalize(&prefix.as_ref().to_string_lossy()));
        let mut prefixes = self
            .allowed_prefixes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !prefixes.contains(&prefix) {
            debug!("Allowing absolute path prefix {:?}", prefix);
            prefixes.push(prefix);
        }
    }

    /// Snapshot of the explicitly allowed prefixes.
    pub fn allowed_prefixes(&self) -> Vec<PathBuf> {
        self.allowed_prefixes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Temporary directory roots detected at construction.
    pub fn temp_roots(&self) -> &[PathBuf] {
        &self.temp_roots
    }

    /// Validates `path` as a file or directory path.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// emptiness, forbidden characters, length, traversal segments,
    /// normalization, traversal after normalization, absolute-path roots,
    /// the normalized character set, and finally directory shape.
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` variant for the first rule violated.
    /// Absolute paths outside every allowed root fail with
    /// `AbsolutePathNotAllowed` for directories and `PathNotAllowed` for
    /// files.
    pub fn validate_path(
        &self,
        path: &str,
        kind: PathKind,
    ) -> Result<NormalizedPath, ValidationError> {
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyPath);
        }

        if path.contains('\0') {
            return Err(ValidationError::NullByte);
        }

        if let Some(character) = path
            .chars()
            .find(|c| INVALID_PATH_CHARACTERS.contains(c) || c.is_whitespace())
        {
            return Err(ValidationError::InvalidPathCharacter { character });
        }

        if path.len() > MAX_PATH_LENGTH {
            return Err(ValidationError::PathTooLong {
                length: path.len(),
                max: MAX_PATH_LENGTH,
            });
        }

        if has_traversal_segment(path) {
            return Err(ValidationError::PathTraversal {
                path: path.to_string(),
            });
        }

        let normalized = normalize(path);

        if has_traversal_segment(&normalized) {
            return Err(ValidationError::PathTraversal {
                path: path.to_string(),
            });
        }

        if normalized.starts_with('/') && !self.is_allowed_absolute(Path::new(&normalized)) {
            debug!("Rejected absolute path {}", normalized);
            return Err(match kind {
                PathKind::Directory => ValidationError::AbsolutePathNotAllowed {
                    path: path.to_string(),
                },
                PathKind::File => ValidationError::PathNotAllowed {
                    path: path.to_string(),
                },
            });
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
        {
            return Err(ValidationError::InvalidNormalizedPath { path: normalized });
        }

        let mut normalized = normalized;
        if kind == PathKind::Directory {
            let has_slash = path.ends_with('/');
            if self.require_directory_slash && !has_slash {
                return Err(ValidationError::MissingTrailingSlash {
                    path: path.to_string(),
                });
            }
            if !has_slash && looks_like_file(&normalized) {
                return Err(ValidationError::NotADirectory {
                    path: path.to_string(),
                });
            }
            if has_slash && !normalized.ends_with('/') {
                normalized.push('/');
            }
        }

        Ok(NormalizedPath(normalized))
    }

    fn is_allowed_absolute(&self, path: &Path) -> bool {
        if let Ok(cwd) = std::env::current_dir() {
            if path.starts_with(&cwd) {
                return true;
            }
        }

        if self.temp_roots.iter().any(|root| path.starts_with(root)) {
            return true;
        }

        self.allowed_prefixes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

impl Default for PathValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Probes for the system temporary directory by creating a scratch
/// directory and recording its parent, both as reported and canonicalized.
fn detect_temp_roots() -> Vec<PathBuf> {
    let probe = match tempfile::TempDir::new() {
        Ok(probe) => probe,
        Err(e) => {
            warn!("Temporary directory probe failed, using fallback roots: {}", e);
            return FALLBACK_TEMP_ROOTS.iter().map(PathBuf::from).collect();
        }
    };

    let mut roots = Vec::new();
    let mut push_root = |root: PathBuf| {
        if !roots.contains(&root) {
            roots.push(root);
        }
    };

    if let Some(parent) = probe.path().parent() {
        push_root(parent.to_path_buf());
        if let Ok(canonical) = parent.canonicalize() {
            push_root(canonical);
        }
    }
    push_root(std::env::temp_dir());

    if let Err(e) = probe.close() {
        warn!("Failed to remove temporary directory probe: {}", e);
    }

    debug!("Detected temporary directory roots: {:?}", roots);
    roots
}

fn has_traversal_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment == "." || segment == "..")
}

/// Lexically normalizes a `/`-separated path.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A `..` with nothing left to remove is kept so the caller still sees it.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Whether the final segment reads like `name.ext` with a short alphabetic
/// extension.
fn looks_like_file(path: &str) -> bool {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, extension)) => {
            !stem.is_empty()
                && (1..=5).contains(&extension.len())
                && extension.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
