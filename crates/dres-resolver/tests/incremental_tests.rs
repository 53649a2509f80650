mod support;

use dres_binder::SourceEdit;
use dres_common::diagnostics::diagnostic_codes;
use dres_common::{SimpleSourceFactory, Source};
use dres_parser::parse_unit;
use dres_resolver::{
    IncrementalError, IncrementalPhase, IncrementalResolver, LibraryResolver, ResolutionState,
    ResolverOptions,
};
use dres_syntax::{NodeKind, ParsedUnit};
use rustc_hash::FxHashMap;
use support::{CORE, Harness, MAIN, resolve_main};

const PROGRAM: &str = "int f(int a) {\n  return a + 1;\n}\nclass C {\n  m() {\n    f(2);\n  }\n}\n";

/// Names of the elements and types at a few fixed places of `PROGRAM`, so
/// two resolutions can be compared.
fn snapshot(h: &Harness, sum: &str) -> Vec<String> {
    let sum_node = h.node_in(MAIN, sum, sum);
    let a = h.node_in(MAIN, sum, "a");
    let call = h.node_in(MAIN, "f(2)", "f(2)");
    let callee = h.element_at(MAIN, "f(2)", "f");
    vec![
        h.static_type_at(MAIN, sum_node),
        h.qualified(h.annotations(MAIN).static_element(sum_node)),
        h.static_type_at(MAIN, a),
        h.qualified(h.annotations(MAIN).static_element(a)),
        h.static_type_at(MAIN, call),
        h.qualified(callee),
    ]
}

#[test]
fn test_unchanged_text_matches_full_resolution() {
    let mut h = resolve_main(PROGRAM);
    let before = snapshot(&h, "a + 1");
    let outcome = h.edit(MAIN, "a + 1", "a + 1").expect("identity edit resolves");
    assert!(matches!(
        h.unit(MAIN).arena.kind(outcome.root),
        Some(NodeKind::FunctionDeclaration { .. })
    ));
    assert_eq!(h.model().name(outcome.root_element), "f");
    assert_eq!(snapshot(&h, "a + 1"), before);
    assert_eq!(before[0], "int");
    assert_eq!(before[5], "f");
}

#[test]
fn test_body_edit_matches_fresh_resolution() {
    let mut h = resolve_main(PROGRAM);
    h.edit(MAIN, "a + 1", "a + 1.5").expect("body edit resolves");

    let fresh = resolve_main(&PROGRAM.replace("a + 1", "a + 1.5"));
    assert_eq!(snapshot(&h, "a + 1.5"), snapshot(&fresh, "a + 1.5"));
    assert_eq!(snapshot(&h, "a + 1.5")[0], "double");
    assert_eq!(h.codes(MAIN), fresh.codes(MAIN));
}

#[test]
fn test_method_edit_resolves_the_method_alone() {
    let mut h = resolve_main(PROGRAM);
    let outcome = h.edit(MAIN, "f(2)", "f(3)").expect("method edit resolves");
    assert!(matches!(
        h.unit(MAIN).arena.kind(outcome.root),
        Some(NodeKind::MethodDeclaration { .. })
    ));
    assert_eq!(h.qualified(outcome.root_element), "C.m");
    let callee = h.element_at(MAIN, "f(3)", "f");
    assert_eq!(h.model().name(callee), "f");
    assert_eq!(outcome.diagnostics, 0);
}

#[test]
fn test_diagnostics_outside_root_are_kept_and_shifted() {
    let text = "f() {\n  undefinedA;\n}\ng() {\n  1;\n}\nh() {\n  undefinedB;\n}\n";
    let mut h = resolve_main(text);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_IDENTIFIER), 2);

    h.edit(MAIN, "  1;", "  12;").expect("edit inside g resolves");
    let fresh = resolve_main(&text.replace("  1;", "  12;"));
    let starts = |h: &Harness| -> Vec<(u32, u32)> {
        h.context
            .diagnostics(&Source::new(MAIN))
            .iter()
            .map(|d| (d.start, d.code))
            .collect()
    };
    assert_eq!(starts(&h), starts(&fresh));
    let b = h.text(MAIN).find("undefinedB").expect("still in source") as u32;
    assert!(starts(&h).contains(&(b, diagnostic_codes::UNDEFINED_IDENTIFIER)));
}

#[test]
fn test_new_diagnostics_inside_root_replace_old_ones() {
    let mut h = resolve_main("f() {\n  undefinedA;\n}\ng() {\n  1;\n}\n");
    let outcome = h.edit(MAIN, "undefinedA", "undefinedZ").expect("edit resolves");
    assert_eq!(outcome.diagnostics, 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_IDENTIFIER), 1);
}

#[test]
fn test_renamed_declaration_is_rejected() {
    let mut h = resolve_main(PROGRAM);
    let before = h.codes(MAIN);
    let err = h.edit(MAIN, "int f(", "int g(").expect_err("rename changes the element model");
    assert!(matches!(err, IncrementalError::ElementNotFound(_)), "got {err}");
    // The previous resolution stays in place.
    assert_eq!(h.codes(MAIN), before);
    assert!(h.text(MAIN).contains("int f("));
    assert_eq!(snapshot(&h, "a + 1")[5], "f");
}

#[test]
fn test_new_local_is_rejected() {
    let mut h = resolve_main(PROGRAM);
    let err = h
        .edit(MAIN, "return a + 1;", "var b; return a + 1;")
        .expect_err("a new local has no element");
    assert!(matches!(err, IncrementalError::ElementNotFound(_)), "got {err}");
}

#[test]
fn test_top_level_variable_has_no_resolution_root() {
    let mut h = resolve_main("var x = 1;\nf() {}\n");
    let err = h.edit(MAIN, "= 1", "= 2").expect_err("variables are not roots");
    assert!(matches!(err, IncrementalError::NoResolvableRoot { .. }), "got {err}");
}

#[test]
fn test_unresolved_unit_is_rejected() {
    let mut h = Harness::new();
    h.add(MAIN, "f() {}\n");
    let unit = parse_unit(Source::new(MAIN), "f() {}\n").expect("parses");
    let err = h
        .context
        .resolve_incrementally(unit, SourceEdit::new(5, 0, 0))
        .expect_err("nothing resolved yet");
    assert!(matches!(err, IncrementalError::UnitNotResolved(_)), "got {err}");
}

// =============================================================================
// Phases
// =============================================================================

struct Fixture {
    sources: SimpleSourceFactory,
    units: FxHashMap<Source, ParsedUnit>,
    options: ResolverOptions,
    state: ResolutionState,
}

impl Fixture {
    fn resolved(text: &str) -> Self {
        let mut fx = Fixture {
            sources: SimpleSourceFactory::new(),
            units: FxHashMap::default(),
            options: ResolverOptions::default(),
            state: ResolutionState::new(),
        };
        for (uri, text) in [("dart:core", CORE), (MAIN, text)] {
            let source = Source::new(uri);
            fx.sources.register(source.clone());
            fx.units.insert(source.clone(), parse_unit(source, text).expect("parses"));
        }
        LibraryResolver::new(&mut fx.state, &fx.sources, &fx.units, &fx.options)
            .resolve_library(&Source::new(MAIN))
            .expect("main resolves");
        fx
    }
}

#[test]
fn test_phase_ends_in_done_or_failed() {
    let mut fx = Fixture::resolved(PROGRAM);
    let main = Source::new(MAIN);
    let old = &fx.units[&main];
    let offset = PROGRAM.find("1;").expect("literal") as u32;

    let same = parse_unit(main.clone(), PROGRAM).expect("parses");
    let mut resolver = IncrementalResolver::new(&mut fx.state, &fx.options);
    assert_eq!(resolver.phase(), IncrementalPhase::Start);
    resolver
        .resolve(old, &same, SourceEdit::new(offset, 1, 1))
        .expect("identity edit resolves");
    assert_eq!(resolver.phase(), IncrementalPhase::Done);

    let renamed = parse_unit(main, &PROGRAM.replace("int f(", "int g(")).expect("parses");
    let at = PROGRAM.find("f(int").expect("name") as u32;
    let mut resolver = IncrementalResolver::new(&mut fx.state, &fx.options);
    resolver
        .resolve(old, &renamed, SourceEdit::new(at, 1, 1))
        .expect_err("rename fails");
    assert_eq!(resolver.phase(), IncrementalPhase::Failed);
}
