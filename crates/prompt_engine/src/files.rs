//! Text file collaborators used by file-based generation.
//!
//! The engine never touches the filesystem directly; it reads templates and
//! writes results through a [`TextFileStore`], so callers can substitute an
//! in-memory store in tests or a remote one in services.

use crate::errors::FileError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, instrument};

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;

/// Reads and writes UTF-8 text files.
#[async_trait]
pub trait TextFileStore: Send + Sync {
    /// Reads the whole file at `path` as text.
    ///
    /// # Errors
    ///
    /// - `FileError::NotFound` when the file does not exist
    /// - `FileError::InvalidUtf8` when the content is not valid UTF-8
    /// - `FileError::Read` for any other I/O failure
    async fn read_text_file(&self, path: &Path) -> Result<String, FileError>;

    /// Writes `content` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `FileError::Write` when the file cannot be written.
    async fn write_text_file(&self, path: &Path, content: &str) -> Result<(), FileError>;
}

/// [`TextFileStore`] backed by the local filesystem.
///
/// Line endings are normalized to `\n` on read, and missing parent
/// directories are created on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTextFileStore;

impl FsTextFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextFileStore for FsTextFileStore {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    async fn read_text_file(&self, path: &Path) -> Result<String, FileError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileError::NotFound {
                path: path.display().to_string(),
            },
            _ => FileError::Read {
                path: path.display().to_string(),
                source: e,
            },
        })?;

        let text = String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8 {
            path: path.display().to_string(),
        })?;

        debug!("Read {} bytes", text.len());
        Ok(normalize_line_endings(&text))
    }

    #[instrument(skip(self, path, content), fields(path = %path.display(), bytes = content.len()))]
    async fn write_text_file(&self, path: &Path, content: &str) -> Result<(), FileError> {
        let write_error = |source| FileError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_error)?;
        }

        tokio::fs::write(path, content).await.map_err(write_error)?;
        debug!("Wrote file");
        Ok(())
    }
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
