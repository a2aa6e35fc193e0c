use super::*;
use std::fs;
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.allowed_prefixes.push(dir.path().to_path_buf());
    config
}

#[tokio::test]
async fn test_execute_lists_all_placeholders() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("prompt.md");
    fs::write(
        &template,
        "Write {schema_file} to {output_dir}.{#if verbose} Notes: {notes_md}{/if}",
    )
    .unwrap();

    let variables = execute(template.to_str().unwrap(), &config_for(&dir))
        .await
        .unwrap();

    let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["schema_file", "output_dir", "verbose", "notes_md"]);

    assert_eq!(variables[0].class, "file");
    assert!(variables[0].reserved);
    assert_eq!(variables[1].class, "directory");
    assert_eq!(variables[2].class, "text");
    assert!(!variables[2].reserved);
    assert_eq!(variables[3].class, "markdown");
}

#[tokio::test]
async fn test_execute_missing_template_fails() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("absent.md");

    let error = execute(template.to_str().unwrap(), &config_for(&dir))
        .await
        .unwrap_err();
    assert!(error.to_string().starts_with("File not found"));
}

#[tokio::test]
async fn test_execute_rejects_traversal() {
    let error = execute("../prompt.md", &AppConfig::default())
        .await
        .unwrap_err();

    assert!(error.to_string().starts_with("Path traversal is not allowed"));
}

#[test]
fn test_format_variables() {
    let variables = vec![
        VariableInfo {
            name: "schema_file".to_string(),
            class: "file".to_string(),
            reserved: true,
        },
        VariableInfo {
            name: "name".to_string(),
            class: "text".to_string(),
            reserved: false,
        },
    ];

    let output = format_variables("prompt.md", &variables);
    assert!(output.contains("schema_file"));
    assert!(output.contains("(file)"));
    assert!(output.contains("[reserved]"));
    assert_eq!(output.lines().count(), 3);

    let empty = format_variables("prompt.md", &[]);
    assert!(empty.contains("(none)"));
}
