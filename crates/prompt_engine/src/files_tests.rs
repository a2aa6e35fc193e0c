use super::*;
use crate::engine::TemplateEngine;
use crate::path_validator::PathValidator;
use crate::variables::Variables;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// In-memory store that records writes.
#[derive(Default)]
struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    fn with_file(path: &str, content: &str) -> Self {
        let store = Self::default();
        store
            .files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        store
    }

    fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

#[async_trait]
impl TextFileStore for MemoryStore {
    async fn read_text_file(&self, path: &Path) -> Result<String, FileError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound {
                path: path.display().to_string(),
            })
    }

    async fn write_text_file(&self, path: &Path, content: &str) -> Result<(), FileError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

fn engine() -> TemplateEngine {
    TemplateEngine::new()
        .with_path_validator(PathValidator::with_temp_roots(vec![PathBuf::from("/tmp")]))
}

fn vars(pairs: &[(&str, &str)]) -> Variables {
    pairs.iter().copied().collect()
}

#[test]
fn test_normalize_line_endings() {
    assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    assert_eq!(normalize_line_endings("unchanged\n"), "unchanged\n");
}

#[tokio::test]
async fn test_fs_store_round_trip_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/prompt.md");
    let store = FsTextFileStore::new();

    store.write_text_file(&path, "line one\r\nline two").await.unwrap();
    let content = store.read_text_file(&path).await.unwrap();

    assert_eq!(content, "line one\nline two");
}

#[tokio::test]
async fn test_fs_store_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.md");

    let error = FsTextFileStore::new().read_text_file(&path).await.unwrap_err();
    assert!(matches!(error, FileError::NotFound { .. }));
    assert!(error.to_string().starts_with("File not found:"));
}

#[tokio::test]
async fn test_fs_store_rejects_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.md");
    std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

    let error = FsTextFileStore::new().read_text_file(&path).await.unwrap_err();
    assert!(matches!(error, FileError::InvalidUtf8 { .. }));
}

#[tokio::test]
async fn test_generate_from_file() {
    let store = MemoryStore::with_file("prompts/review.md", "Review {target} carefully");

    let report = engine()
        .generate_from_file(&store, "prompts/review.md", &vars(&[("target", "parser")]))
        .await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.content.as_deref(), Some("Review parser carefully"));
}

#[tokio::test]
async fn test_generate_from_file_validates_path_first() {
    let store = MemoryStore::with_file("../outside.md", "{x}");

    let report = engine()
        .generate_from_file(&store, "../outside.md", &Variables::new())
        .await;

    assert!(!report.success);
    assert!(report
        .error
        .unwrap()
        .starts_with("Path traversal is not allowed"));
}

#[tokio::test]
async fn test_generate_from_missing_file_reports_error() {
    let store = MemoryStore::default();

    let report = engine()
        .generate_from_file(&store, "prompts/missing.md", &Variables::new())
        .await;

    assert!(!report.success);
    assert_eq!(
        report.error.as_deref(),
        Some("File not found: prompts/missing.md")
    );
    assert!(report.variables.detected.is_empty());
}

#[tokio::test]
async fn test_render_to_file_writes_output() {
    let store = MemoryStore::with_file("in.md", "Hello {name}");

    let report = engine()
        .render_to_file(&store, "in.md", "out/hello.md", &vars(&[("name", "John")]))
        .await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(store.file("out/hello.md").as_deref(), Some("Hello John"));
}

#[tokio::test]
async fn test_render_to_file_skips_write_on_failure() {
    let store = MemoryStore::with_file("in.md", "");

    let report = engine()
        .render_to_file(&store, "in.md", "out/hello.md", &Variables::new())
        .await;

    assert!(!report.success);
    assert!(store.file("out/hello.md").is_none());
}

#[tokio::test]
async fn test_render_to_file_rejects_bad_output_path() {
    let store = MemoryStore::with_file("in.md", "Hello");

    let report = engine()
        .render_to_file(&store, "in.md", "/etc/passwd", &Variables::new())
        .await;

    assert!(!report.success);
    assert_eq!(
        report.error.as_deref(),
        Some("Path is not allowed: /etc/passwd")
    );
    assert!(store.file("/etc/passwd").is_none());
}

#[tokio::test]
async fn test_render_to_real_filesystem() {
    let dir = TempDir::new().unwrap();
    let engine = engine();
    engine.path_validator().allow_prefix(dir.path());

    let template = dir.path().join("template.md");
    let output = dir.path().join("generated/prompt.md");
    std::fs::write(&template, "Task: {task}\r\n").unwrap();

    let store = FsTextFileStore::new();
    let report = engine
        .render_to_file(
            &store,
            template.to_str().unwrap(),
            output.to_str().unwrap(),
            &vars(&[("task", "triage")]),
        )
        .await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "Task: triage\n");
}
