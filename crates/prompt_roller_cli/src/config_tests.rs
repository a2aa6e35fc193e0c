use super::*;
use prompt_engine::{PathKind, SubstitutionMode, ValueKind, Variables};
use tempfile::TempDir;

#[test]
fn test_app_config_default() {
    let config = AppConfig::default();

    assert_eq!(config.engine.mode, SubstitutionMode::Tolerant);
    assert!(config.paths.allowed_prefixes.is_empty());
    assert!(!config.reserved.extended);
    assert!(config.reserved.names.is_empty());
}

#[test]
fn test_app_config_load_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("invalid_config.toml");

    fs::write(&config_path, "invalid = toml = syntax").expect("Failed to write invalid TOML");

    let result = AppConfig::load(&config_path);

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Failed to parse configuration file"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_app_config_load_nonexistent_file() {
    let result = AppConfig::load(Path::new("nonexistent_config.toml"));

    if let Err(Error::Config(msg)) = result {
        assert!(msg.contains("Configuration file not found"));
    } else {
        panic!("Expected Config error");
    }
}

#[test]
fn test_app_config_load_partial_sections() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("prompt-roller.toml");
    fs::write(
        &config_path,
        r#"
[engine]
mode = "strict"

[reserved.names]
release_date = "date"
"#,
    )
    .unwrap();

    let config = AppConfig::load(&config_path).expect("Failed to load config");

    assert_eq!(config.engine.mode, SubstitutionMode::Strict);
    assert!(config.engine.escape_html);
    assert_eq!(config.reserved.names["release_date"], "date");
}

#[test]
fn test_app_config_load_paths_section() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("prompt-roller.toml");
    fs::write(
        &config_path,
        "[paths]\nallowed_prefixes = [\"/srv/prompts\"]\nrequire_directory_slash = true\n",
    )
    .expect("Failed to write config");

    let loaded = AppConfig::load(&config_path).expect("Failed to load config");
    assert_eq!(
        loaded.paths.allowed_prefixes,
        vec![PathBuf::from("/srv/prompts")]
    );
    assert!(loaded.paths.require_directory_slash);
}

#[test]
fn test_build_engine_requires_directory_slash() {
    let mut config = AppConfig::default();
    config.paths.require_directory_slash = true;
    config.paths.allowed_prefixes.push(PathBuf::from("/srv/prompts"));

    let engine = config.build_engine().unwrap();
    let validator = engine.path_validator();

    assert!(validator.validate_path("output/", PathKind::Directory).is_ok());
    assert!(validator.validate_path("output", PathKind::Directory).is_err());
    assert!(validator.validate_path("output.md", PathKind::File).is_ok());
    assert!(validator
        .validate_path("/srv/prompts/out/", PathKind::Directory)
        .is_ok());
}

#[test]
fn test_discover_uses_default_file_in_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(DEFAULT_CONFIG_FILENAME),
        "[engine]\nescape_html = false\n",
    )
    .unwrap();

    let config = AppConfig::discover(None, temp_dir.path()).unwrap();
    assert!(!config.engine.escape_html);
}

#[test]
fn test_discover_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let config = AppConfig::discover(None, temp_dir.path()).unwrap();
    assert!(config.engine.escape_html);
}

#[test]
fn test_discover_requires_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("custom.toml");

    let result = AppConfig::discover(missing.to_str(), temp_dir.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_reserved_variables_from_config() {
    let mut config = AppConfig::default();
    config.reserved.extended = true;
    config
        .reserved
        .names
        .insert("release_date".to_string(), "date".to_string());

    let reserved = config.reserved_variables().unwrap();

    assert!(reserved.contains("input_markdown"));
    assert_eq!(
        reserved.get("release_date"),
        Some(VariableClass::Typed(ValueKind::Date))
    );
}

#[test]
fn test_reserved_variables_rejects_unknown_class() {
    let mut config = AppConfig::default();
    config
        .reserved
        .names
        .insert("notes".to_string(), "yaml".to_string());

    let error = config.reserved_variables().unwrap_err();
    assert!(error.to_string().contains("Reserved variable `notes`"));
}

#[test]
fn test_reserved_variables_rejects_invalid_name() {
    let mut config = AppConfig::default();
    config
        .reserved
        .names
        .insert("release-date".to_string(), "date".to_string());

    assert!(matches!(
        config.reserved_variables(),
        Err(Error::Engine(_))
    ));
}

#[test]
fn test_build_engine_applies_allowed_prefixes() {
    let mut config = AppConfig::default();
    config.paths.allowed_prefixes.push(PathBuf::from("/srv/prompts"));

    let engine = config.build_engine().unwrap();

    assert!(engine
        .path_validator()
        .validate_path("/srv/prompts/review.md", PathKind::File)
        .is_ok());

    let variables: Variables = [("schema_file", "/srv/prompts/schema.json")]
        .into_iter()
        .collect();
    let report = engine.generate("Schema: {schema_file}", &variables);
    assert_eq!(
        report.content.as_deref(),
        Some("Schema: /srv/prompts/schema.json")
    );
}
