use super::*;
use std::io::Write;

#[test]
fn test_defaults_when_keys_are_missing() {
    let options = ResolverOptions::from_json("{}").expect("empty object is valid");
    assert_eq!(options, ResolverOptions::default());
    assert!(options.generate_hints);
    assert!(options.enable_type_promotion);
    assert!(!options.enable_union_types);
}

#[test]
fn test_booleans_accept_strings() {
    let options = ResolverOptions::from_json(
        r#"{"generateHints": "off", "enableUnionTypes": "yes", "strictUnionTypes": true}"#,
    )
    .expect("string booleans are accepted");
    assert!(!options.generate_hints);
    assert!(options.enable_union_types);
    assert!(options.strict_union_types);
    assert!(options.analyze_function_bodies);
}

#[test]
fn test_invalid_boolean_string_is_an_error() {
    let err = ResolverOptions::from_json(r#"{"generateHints": "maybe"}"#)
        .expect_err("unknown boolean spelling");
    let chain = format!("{err:#}");
    assert!(chain.contains("invalid boolean value"), "got: {chain}");
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"enableDeferredLoading": false}}"#).expect("write options");
    let options = ResolverOptions::load(file.path()).expect("options load");
    assert!(!options.enable_deferred_loading);
}

#[test]
fn test_load_reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing.json");
    let err = ResolverOptions::load(&missing).expect_err("file does not exist");
    assert!(err.to_string().contains("failed to read resolver options"));
}
