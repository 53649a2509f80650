mod support;

use dres_binder::{DeclarationMatcher, DeclarationMismatch, SourceEdit, UNARY_MINUS, UnitAnnotations};
use dres_common::Source;
use dres_element::{ElementId, ElementKind};
use dres_parser::parse_unit;
use dres_syntax::{NodeIndex, NodeKind, ParsedUnit};
use support::{Fixture, find};

const URI: &str = "/app/a.dart";

fn reparse(text: &str) -> ParsedUnit {
    parse_unit(Source::new(URI), text).expect("edited text should parse")
}

fn class_node(unit: &ParsedUnit) -> NodeIndex {
    find(unit, |k| matches!(k, NodeKind::ClassDeclaration { .. }))
}

fn setup(text: &str) -> (Fixture, ElementId) {
    let mut fx = Fixture::new();
    let lib = fx.build_one(URI, text);
    let unit = fx.defining_unit(lib);
    (fx, unit)
}

#[test]
fn test_same_tree_matches_class() {
    let text = "class A<T> {\n  int x, y;\n  final z = () => 1;\n  A(this.x);\n  A.named() : y = 2;\n  m(a, [b]) {\n    var l = 1;\n    L: while (true) { break L; }\n    try {} catch (e) {}\n    local(q) => q;\n    return (r) => r;\n  }\n  get g => x;\n  set g(v) {}\n}\n";
    let (fx, unit) = setup(text);
    let tree = reparse(text);
    let root = class_node(&tree);
    let matched = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, root, unit)
        .expect("unchanged declarations match");
    assert_eq!(matched.root_element, fx.class(fx.model.elements.library_of(unit), "A"));
    assert!(matched.binding_count() > 10);
}

#[test]
fn test_same_tree_matches_whole_unit() {
    let text = "var v = 1;\ntypedef F(int a);\nf() {}\nclass B {}\nclass M = B with B;\n";
    let (fx, unit) = setup(text);
    let tree = reparse(text);
    let matched = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, tree.root, unit)
        .expect("unchanged unit matches");
    assert_eq!(matched.root_element, unit);
}

#[test]
fn test_unary_minus_is_keyed_separately() {
    let text = "class A {\n  operator -() => this;\n  operator -(o) => this;\n}\n";
    let (fx, unit) = setup(text);
    let tree = reparse(text);
    let matched = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, class_node(&tree), unit)
        .expect("operators match");
    let methods: Vec<NodeIndex> = tree
        .arena
        .descendants(tree.root)
        .into_iter()
        .filter(|&n| matches!(tree.arena.kind(n), Some(NodeKind::MethodDeclaration { .. })))
        .collect();
    assert_eq!(fx.model.name(matched.element_for(methods[0])), UNARY_MINUS);
    assert_eq!(fx.model.name(matched.element_for(methods[1])), "-");
}

#[test]
fn test_method_root_matches_in_class_context() {
    let text = "class A {\n  m(a) { var x; }\n  n() {}\n}\n";
    let (fx, unit) = setup(text);
    let tree = reparse(text);
    let method = find(&tree, |k| matches!(k, NodeKind::MethodDeclaration { .. }));
    let matched = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, method, unit)
        .expect("method matches");
    assert_eq!(fx.model.kind(matched.root_element), Some(ElementKind::Method));
    assert_eq!(fx.model.name(matched.root_element), "m");
}

#[test]
fn test_added_declaration_is_a_mismatch() {
    let (fx, unit) = setup("class A {\n  m() {}\n}\n");
    let tree = reparse("class A {\n  m() {}\n  o() {}\n}\n");
    let err = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, class_node(&tree), unit)
        .expect_err("new method has no element");
    assert!(matches!(err, DeclarationMismatch::ElementNotFound { ref name, .. } if name == "o"));
}

#[test]
fn test_removed_declaration_is_a_mismatch() {
    let (fx, unit) = setup("class A {\n  m() {}\n  n() {}\n}\n");
    let tree = reparse("class A {\n  m() {}\n}\n");
    let err = DeclarationMatcher::new(&fx.model, None)
        .match_subtree(&tree.arena, class_node(&tree), unit)
        .expect_err("n is no longer declared");
    assert!(matches!(err, DeclarationMismatch::UnmatchedElements { count: 1, .. }));
    assert!(err.to_string().contains("'n'"));
}

#[test]
fn test_new_local_is_a_mismatch() {
    let (fx, unit) = setup("class A {\n  m() {}\n}\n");
    let tree = reparse("class A {\n  m() { var x; }\n}\n");
    let method = find(&tree, |k| matches!(k, NodeKind::MethodDeclaration { .. }));
    assert!(
        DeclarationMatcher::new(&fx.model, None)
            .match_subtree(&tree.arena, method, unit)
            .is_err()
    );
}

#[test]
fn test_edit_shifts_expected_offsets() {
    let old = "class A {\n  m() {}\n  n() {}\n}\n";
    let new = "class A {\n  m() { print(1); }\n  n() {}\n}\n";
    let (mut fx, unit) = setup(old);
    let insert_at = old.find("{}").unwrap_or(0) as u32 + 1;
    let inserted = " print(1); ".len() as u32;
    let edit = SourceEdit::new(insert_at, 0, inserted);
    let tree = reparse(new);
    let class = class_node(&tree);

    assert!(
        DeclarationMatcher::new(&fx.model, None)
            .match_subtree(&tree.arena, class, unit)
            .is_err(),
        "n moved, so an offset-exact match fails without the edit"
    );
    let matched = DeclarationMatcher::new(&fx.model, Some(edit))
        .match_subtree(&tree.arena, class, unit)
        .expect("edit accounts for the moved declaration");

    let a = matched.root_element;
    let n = fx.model.get_method(a, "n");
    let old_offset = fx.model.element(n).map(|e| e.name_offset);
    assert_eq!(old_offset, Some(old.find("n()").unwrap_or(0) as u32));

    let mut annotations = UnitAnnotations::new();
    matched.commit(&mut fx.model, &tree.arena, &mut annotations);
    let new_offset = fx.model.element(n).map(|e| e.name_offset);
    assert_eq!(new_offset, Some(new.find("n()").unwrap_or(0) as u32));
    assert_eq!(annotations.declared_element(class), a);
}

#[test]
fn test_source_edit_offsets() {
    let edit = SourceEdit::new(10, 2, 5);
    assert_eq!(edit.delta(), 3);
    assert_eq!(edit.old_offset(4), 4);
    assert_eq!(edit.old_offset(20), 17);
    assert_eq!(edit.new_offset(17), 20);
    assert_eq!(edit.new_offset(11), 11);
}
