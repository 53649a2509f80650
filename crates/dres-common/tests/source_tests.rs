use super::*;

#[test]
fn test_relative_uri_joins_base_directory() {
    let base = Source::new("/project/lib/main.dart");
    assert_eq!(
        SimpleSourceFactory::join(&base, "util.dart").as_deref(),
        Some("/project/lib/util.dart")
    );
    assert_eq!(
        SimpleSourceFactory::join(&base, "../test/a.dart").as_deref(),
        Some("/project/test/a.dart")
    );
    assert_eq!(
        SimpleSourceFactory::join(&base, "./src/./b.dart").as_deref(),
        Some("/project/lib/src/b.dart")
    );
}

#[test]
fn test_scheme_uris_are_absolute() {
    let base = Source::new("/project/lib/main.dart");
    assert_eq!(
        SimpleSourceFactory::join(&base, "dart:core").as_deref(),
        Some("dart:core")
    );
    assert_eq!(
        SimpleSourceFactory::join(&base, "package:foo/foo.dart").as_deref(),
        Some("package:foo/foo.dart")
    );
}

#[test]
fn test_relative_uri_inside_package_keeps_scheme() {
    let base = Source::new("package:foo/src/a.dart");
    assert_eq!(
        SimpleSourceFactory::join(&base, "b.dart").as_deref(),
        Some("package:foo/src/b.dart")
    );
}

#[test]
fn test_resolve_uri_requires_registered_source() {
    let mut factory = SimpleSourceFactory::new();
    factory.register(Source::new("/p/a.dart"));
    let base = Source::new("/p/main.dart");
    assert_eq!(
        factory.resolve_uri(&base, "a.dart"),
        Some(Source::new("/p/a.dart"))
    );
    assert_eq!(factory.resolve_uri(&base, "missing.dart"), None);
    assert_eq!(factory.resolve_uri(&base, ""), None);
}

#[test]
fn test_source_short_name_and_sdk_detection() {
    assert_eq!(Source::new("/p/lib/a.dart").short_name(), "a.dart");
    assert_eq!(Source::new("dart:core").short_name(), "core");
    assert!(Source::new("dart:html").is_dart_uri());
    assert!(!Source::new("/p/a.dart").is_dart_uri());
}
