use super::*;
use crate::reserved::ReservedVariables;

fn variables(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_plain_value_is_returned_as_is() {
    let vars = variables(&[("name", "John")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("name").unwrap(), "John");
}

#[test]
fn test_nested_references_are_expanded() {
    let vars = variables(&[
        ("intro", "Hello {name}, welcome to {project}."),
        ("name", "{first} {last}"),
        ("first", "John"),
        ("last", "Doe"),
        ("project", "PromptRoller"),
    ]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(
        resolver.resolve_variable("intro").unwrap(),
        "Hello John Doe, welcome to PromptRoller."
    );
    assert_eq!(resolver.resolve_variable("name").unwrap(), "John Doe");
}

#[test]
fn test_surrounding_whitespace_is_preserved() {
    let vars = variables(&[("outer", "  [ {inner} ]\n"), ("inner", "x")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("outer").unwrap(), "  [ x ]\n");
}

#[test]
fn test_repeated_reference_is_expanded_each_time() {
    let vars = variables(&[("pair", "{item}/{item}"), ("item", "{leaf}"), ("leaf", "v")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("pair").unwrap(), "v/v");
    assert_eq!(resolver.resolve_variable("item").unwrap(), "v");
}

#[test]
fn test_two_variable_cycle_is_detected_from_either_side() {
    let vars = variables(&[("a", "{b}"), ("b", "{a}")]);
    let keys = VariableKeyValidator::new();

    for start in ["a", "b"] {
        let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);
        let error = resolver.resolve_variable(start).unwrap_err();
        assert!(
            matches!(error, Error::Template(TemplateError::CircularReference { .. })),
            "start {start} gave {error:?}"
        );
        assert!(error
            .to_string()
            .starts_with("Circular variable reference detected"));
    }
}

#[test]
fn test_cycle_chain_is_reported() {
    let vars = variables(&[("a", "x {b}"), ("b", "y {c}"), ("c", "z {a}")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    let error = resolver.resolve_variable("a").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Circular variable reference detected: a -> b -> c -> a"
    );
}

#[test]
fn test_self_reference_is_a_cycle() {
    let vars = variables(&[("a", "again {a}")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert!(matches!(
        resolver.resolve_variable("a"),
        Err(Error::Template(TemplateError::CircularReference { chain })) if chain == vec!["a", "a"]
    ));
}

#[test]
fn test_visited_path_counts_as_cycle() {
    let vars = variables(&[("a", "{b}"), ("b", "leaf")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    let visited: HashSet<String> = ["b".to_string()].into_iter().collect();
    assert!(resolver.resolve_with_path("a", &visited).is_err());
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let vars = variables(&[
        ("top", "{left}+{right}"),
        ("left", "{base}"),
        ("right", "{base}"),
        ("base", "1"),
    ]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("top").unwrap(), "1+1");
}

#[test]
fn test_missing_reference_in_tolerant_mode_is_empty() {
    let vars = variables(&[("greeting", "Hello {name}!")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("greeting").unwrap(), "Hello !");
    assert_eq!(resolver.resolve_variable("absent").unwrap(), "");
}

#[test]
fn test_missing_reference_in_strict_mode_fails() {
    let vars = variables(&[("greeting", "Hello {name}!")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Strict);

    let error = resolver.resolve_variable("greeting").unwrap_err();
    assert_eq!(error.to_string(), "Missing required variable: name");
}

#[test]
fn test_invalid_reference_name_fails() {
    let vars = variables(&[("greeting", "Hello {first-name}!")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    let error = resolver.resolve_variable("greeting").unwrap_err();
    assert!(error.to_string().contains("cannot contain hyphens"));
}

#[test]
fn test_invalid_root_name_fails() {
    let vars = variables(&[]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert!(matches!(
        resolver.resolve_variable("9lives"),
        Err(Error::Validation(ValidationError::InvalidVariableName { .. }))
    ));
}

#[test]
fn test_conditional_tokens_pass_through() {
    let vars = variables(&[("body", "{#if verbose}details{/if}")]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(
        resolver.resolve_variable("body").unwrap(),
        "{#if verbose}details{/if}"
    );
}

#[test]
fn test_non_reference_braces_are_left_alone() {
    let vars = variables(&[("code", r#"fn main() {} {"key": 1} { spaced }"#)]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(
        resolver.resolve_variable("code").unwrap(),
        r#"fn main() {} {"key": 1} { spaced }"#
    );
}

#[test]
fn test_format_braces_are_not_references() {
    let vars = variables(&[
        ("code", r#"println!("{x:?} {0} {user.name} {_hidden}");"#),
        ("note", "index {0} of {name}"),
        ("name", "list"),
    ]);
    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Strict);

    assert_eq!(
        resolver.resolve_variable("code").unwrap(),
        r#"println!("{x:?} {0} {user.name} {_hidden}");"#
    );
    assert_eq!(resolver.resolve_variable("note").unwrap(), "index {0} of list");
}

#[test]
fn test_long_chain_does_not_recurse() {
    let depth = 5_000;
    let mut vars = HashMap::new();
    for i in 0..depth {
        vars.insert(format!("v{}", i), format!("{{v{}}}", i + 1));
    }
    vars.insert(format!("v{}", depth), "end".to_string());

    let keys = VariableKeyValidator::new();
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    assert_eq!(resolver.resolve_variable("v0").unwrap(), "end");
}

#[test]
fn test_reserved_only_keys_apply_to_references() {
    let vars = variables(&[("schema_file", "{project_name}.json")]);
    let keys = VariableKeyValidator::reserved_only(ReservedVariables::default());
    let mut resolver = VariableResolver::new(&vars, &keys, SubstitutionMode::Tolerant);

    let error = resolver.resolve_variable("schema_file").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Non-reserved variable not allowed: `project_name`"
    );
}
