mod support;

use dres_common::Source;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::find_class;
use dres_parser::parse_unit;
use dres_resolver::{AnalysisContext, LibraryResolutionError, ResolverOptions};
use std::io::Write;
use support::{Harness, MAIN, resolve_main, resolve_main_with};

fn field_type(h: &Harness, library_uri: &str, class: &str, field: &str) -> String {
    let library = h.model().library(&Source::new(library_uri)).expect("library built");
    let class = find_class(h.model(), library, class).expect("class declared");
    let field = h.model().get_field(class, field);
    h.type_name(h.model().element_type(field))
}

#[test]
fn test_import_cycle_resolves_both_libraries() {
    let mut h = Harness::new();
    h.add("/app/a.dart", "library a;\nimport 'b.dart';\nclass A {\n  B b;\n}\n");
    h.add("/app/b.dart", "library b;\nimport 'a.dart';\nclass B {\n  A a;\n}\n");
    h.resolve("/app/a.dart");

    assert!(h.context.library(&Source::new("/app/b.dart")).is_some());
    assert_eq!(field_type(&h, "/app/a.dart", "A", "b"), "B");
    assert_eq!(field_type(&h, "/app/b.dart", "B", "a"), "A");
    assert!(h.codes("/app/a.dart").is_empty(), "got {:?}", h.codes("/app/a.dart"));
    assert!(h.codes("/app/b.dart").is_empty(), "got {:?}", h.codes("/app/b.dart"));
}

#[test]
fn test_core_is_imported_implicitly() {
    let h = resolve_main("class C {\n  String s;\n}\n");
    assert!(h.context.library(&Source::new("dart:core")).is_some());
    assert!(h.context.provider().is_some());
    assert_eq!(field_type(&h, MAIN, "C", "s"), "String");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_resolving_twice_returns_the_same_library() {
    let mut h = resolve_main("f() {}\n");
    let first = h.context.library(&Source::new(MAIN)).expect("resolved").library;
    assert_eq!(h.resolve(MAIN), first);
}

#[test]
fn test_missing_core_library_is_an_error() {
    let mut context = AnalysisContext::new(ResolverOptions::default());
    let main = Source::new(MAIN);
    context.add_unit(parse_unit(main.clone(), "f() {}\n").expect("parses"));
    let err = context.resolve_library(&main).expect_err("no core");
    assert!(matches!(err, LibraryResolutionError::MissingCoreLibrary { .. }), "got {err}");
}

#[test]
fn test_incomplete_core_library_is_an_error() {
    let mut context = AnalysisContext::new(ResolverOptions::default());
    let core = Source::new("dart:core");
    context.add_unit(parse_unit(core, "library dart.core;\nclass Object {}\n").expect("parses"));
    let main = Source::new(MAIN);
    context.add_unit(parse_unit(main.clone(), "f() {}\n").expect("parses"));
    let err = context.resolve_library(&main).expect_err("core lacks classes");
    assert!(matches!(err, LibraryResolutionError::MissingCoreLibrary { .. }), "got {err}");
}

#[test]
fn test_missing_source_is_an_error() {
    let mut h = Harness::new();
    let err = h
        .context
        .resolve_library(&Source::new("/app/nowhere.dart"))
        .expect_err("never added");
    assert!(matches!(err, LibraryResolutionError::MissingSource(_)), "got {err}");
}

#[test]
fn test_missing_import_is_reported() {
    let h = resolve_main("import 'missing.dart';\nf() {}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::URI_DOES_NOT_EXIST), 1);
}

#[test]
fn test_parts_are_resolved_with_their_library() {
    let mut h = Harness::new();
    h.add("/app/part.dart", "part of app;\ng() => 1;\n");
    h.add(MAIN, "library app;\npart 'part.dart';\nf() => g();\n");
    h.resolve(MAIN);

    let library = h.context.library(&Source::new(MAIN)).expect("resolved");
    assert_eq!(library.units, vec![Source::new(MAIN), Source::new("/app/part.dart")]);
    let g = h.element_at(MAIN, "g()", "g");
    assert_eq!(h.model().name(g), "g");
    let one = h.node_in("/app/part.dart", "=> 1", "1");
    assert_eq!(h.static_type_at("/app/part.dart", one), "int");
}

// =============================================================================
// Invalidation
// =============================================================================

#[test]
fn test_invalidation_drops_dependents() {
    let mut h = Harness::new();
    h.add("/app/lib.dart", "library lib;\nclass L {}\n");
    h.add("/app/other.dart", "library other;\nclass O {}\n");
    h.add(MAIN, "import 'lib.dart';\nL l;\n");
    h.resolve(MAIN);
    h.resolve("/app/other.dart");

    let mut dropped = h.context.invalidate_library(&Source::new("/app/lib.dart"));
    dropped.sort();
    assert_eq!(dropped, vec![Source::new("/app/lib.dart"), Source::new(MAIN)]);
    assert!(h.context.library(&Source::new(MAIN)).is_none());
    assert!(h.context.annotations(&Source::new(MAIN)).is_none());
    assert!(h.context.library(&Source::new("/app/other.dart")).is_some());
    assert!(h.model().library(&Source::new("/app/lib.dart")).is_none());

    h.resolve(MAIN);
    assert!(h.context.library(&Source::new("/app/lib.dart")).is_some());
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_invalidating_core_drops_everything() {
    let mut h = resolve_main("f() {}\n");
    let dropped = h.context.invalidate_library(&Source::new("dart:core"));
    assert_eq!(dropped.len(), 2);
    assert!(h.context.provider().is_none());
    assert!(h.context.library(&Source::new(MAIN)).is_none());
    h.resolve(MAIN);
    assert!(h.context.provider().is_some());
}

#[test]
fn test_invalidating_unknown_library_is_a_no_op() {
    let mut h = resolve_main("f() {}\n");
    assert!(h.context.invalidate_library(&Source::new("/app/x.dart")).is_empty());
    assert!(h.context.library(&Source::new(MAIN)).is_some());
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_skipping_function_bodies() {
    let options = ResolverOptions {
        analyze_function_bodies: false,
        ..ResolverOptions::default()
    };
    let h = resolve_main_with(options, "f() {\n  nope;\n}\nclass C {\n  Undefined u;\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_IDENTIFIER), 0);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_CLASS), 1);
    let nope = h.node_in(MAIN, "nope", "nope");
    assert!(h.annotations(MAIN).static_type(nope).is_none());
}

#[test]
fn test_context_reads_options_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"generateHints": false, "analyzeFunctionBodies": "off"}}"#).expect("write");
    let context = AnalysisContext::from_options_file(file.path()).expect("options load");
    assert!(!context.options().generate_hints);
    assert!(!context.options().analyze_function_bodies);
    assert!(context.options().enable_type_promotion);
}

#[test]
fn test_all_diagnostics_are_ordered_by_source() {
    let mut h = Harness::new();
    h.add("/app/b.dart", "library b;\nf() {\n  nope;\n}\n");
    h.add("/app/a.dart", "library a;\nimport 'b.dart';\ng() {\n  nope;\n  nada;\n}\n");
    h.resolve("/app/a.dart");
    let all: Vec<(String, u32)> = h
        .context
        .all_diagnostics()
        .into_iter()
        .map(|d| (d.source.uri().to_string(), d.start))
        .collect();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].0, "/app/a.dart");
    assert!(all[0].1 < all[1].1);
    assert_eq!(all[2].0, "/app/b.dart");
}
