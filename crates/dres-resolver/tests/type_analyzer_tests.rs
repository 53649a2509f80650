mod support;

use dres_binder::UNARY_MINUS;
use dres_common::Source;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::Element;
use dres_resolver::ResolverOptions;
use dres_syntax::NodeKind;
use support::{Harness, MAIN, resolve_main, resolve_main_with};

/// Static type of the expression spelled exactly `expr` inside `context`.
fn static_of(h: &Harness, context: &str, expr: &str) -> String {
    let node = h.node_in(MAIN, context, expr);
    h.static_type_at(MAIN, node)
}

fn propagated_of(h: &Harness, context: &str, expr: &str) -> Option<String> {
    let node = h.node_in(MAIN, context, expr);
    h.propagated_type_at(MAIN, node)
}

// =============================================================================
// Literals and operators
// =============================================================================

#[test]
fn test_literal_types() {
    let h = resolve_main("f() {\n  1;\n  2.0;\n  'a';\n  true;\n  null;\n}\n");
    assert_eq!(static_of(&h, "  1;", "1"), "int");
    assert_eq!(static_of(&h, "2.0", "2.0"), "double");
    assert_eq!(static_of(&h, "'a'", "'a'"), "String");
    assert_eq!(static_of(&h, "true", "true"), "bool");
    assert_eq!(static_of(&h, "null", "null"), "bottom");
}

#[test]
fn test_numeric_operators_refine_to_int_and_double() {
    let h = resolve_main("f(int i, double d) {\n  i + i;\n  i + d;\n  d * i;\n  i < d;\n}\n");
    assert_eq!(static_of(&h, "i + i", "i + i"), "int");
    assert_eq!(static_of(&h, "i + d", "i + d"), "double");
    assert_eq!(static_of(&h, "d * i", "d * i"), "double");
    assert_eq!(static_of(&h, "i < d", "i < d"), "bool");
    let plus = h.node_in(MAIN, "i + i", "i + i");
    let element = h.annotations(MAIN).static_element(plus);
    assert_eq!(h.qualified(element), "num.+");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_unary_and_binary_minus_bind_different_operators() {
    let h = resolve_main(
        "class V {\n  V operator -() => this;\n  V operator -(V o) => this;\n}\nf(V a, V b) {\n  -a;\n  a - b;\n}\n",
    );
    let unary = h.enclosing(MAIN, "  -a;", "a", |k| matches!(k, NodeKind::PrefixExpression { .. }));
    let unary_element = h.annotations(MAIN).static_element(unary);
    assert_eq!(h.model().name(unary_element), UNARY_MINUS);
    assert!(h.model().parameters(unary_element).is_empty());
    assert_eq!(h.static_type_at(MAIN, unary), "V");

    let binary = h.node_in(MAIN, "a - b", "a - b");
    let binary_element = h.annotations(MAIN).static_element(binary);
    assert_eq!(h.model().name(binary_element), "-");
    assert_eq!(h.model().parameters(binary_element).len(), 1);
}

#[test]
fn test_undefined_operator_is_reported() {
    let h = resolve_main("class V {}\nf(V a) {\n  a + a;\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_OPERATOR), 1);
}

#[test]
fn test_equality_and_relational_operators_bind_methods() {
    let h = resolve_main(
        "class A {\n  bool operator <=(A other) => true;\n}\nf(Object a, Object b, A x, A y) {\n  a == b;\n  x <= y;\n}\n",
    );
    let eq = h.node_in(MAIN, "a == b", "a == b");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(eq)), "Object.==");
    assert_eq!(h.static_type_at(MAIN, eq), "bool");
    let le = h.node_in(MAIN, "x <= y", "x <= y");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(le)), "A.<=");
    assert_eq!(h.static_type_at(MAIN, le), "bool");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_index_assignment_binds_index_setter() {
    let h = resolve_main(
        "f(List<int> l, Map<String, int> m) {\n  l[0] = 1;\n  m['a'] = 2;\n  l[0];\n}\n",
    );
    let list_write = h.node_in(MAIN, "l[0] = 1", "l[0]");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(list_write)), "List.[]=");
    assert_eq!(h.static_type_at(MAIN, list_write), "int");
    let map_write = h.node_in(MAIN, "m['a'] = 2", "m['a']");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(map_write)), "Map.[]=");
    let read = h.node_in(MAIN, "  l[0];", "l[0]");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(read)), "List.[]");
    assert_eq!(h.static_type_at(MAIN, read), "int");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_compound_index_assignment_binds_setter_and_getter() {
    let h = resolve_main("f(List<int> l) {\n  l[0] += 1;\n}\n");
    let index = h.node_in(MAIN, "l[0] += 1", "l[0]");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(index)), "List.[]=");
    let aux = h.annotations(MAIN).auxiliary(index).expect("getter bound");
    assert_eq!(h.qualified(aux.static_element), "List.[]");
    let assignment = h.node_in(MAIN, "l[0] += 1", "l[0] += 1");
    assert_eq!(h.qualified(h.annotations(MAIN).static_element(assignment)), "num.+");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_conditional_takes_least_upper_bound() {
    let h = resolve_main("f(bool c, int i, double d) {\n  c ? i : d;\n  c ? i : i;\n}\n");
    assert_eq!(static_of(&h, "c ? i : d", "c ? i : d"), "num");
    assert_eq!(static_of(&h, "c ? i : i", "c ? i : i"), "int");
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn test_var_initializer_propagates_to_reads() {
    let h = resolve_main("f() {\n  var s = 'x';\n  s;\n}\n");
    assert_eq!(static_of(&h, "  s;", "s"), "dynamic");
    assert_eq!(propagated_of(&h, "  s;", "s").as_deref(), Some("String"));
}

#[test]
fn test_list_literal_propagates_common_element_type() {
    let h = resolve_main("f() {\n  [1, 2];\n  <num>[1];\n}\n");
    assert_eq!(propagated_of(&h, "[1, 2]", "[1, 2]").as_deref(), Some("List<int>"));
    assert_eq!(static_of(&h, "<num>[1]", "<num>[1]"), "List<num>");
    assert_eq!(propagated_of(&h, "<num>[1]", "<num>[1]"), None);
}

#[test]
fn test_for_each_variable_takes_iterator_current() {
    let h = resolve_main("f(List<int> xs) {\n  for (var x in xs) {\n    x;\n  }\n}\n");
    assert_eq!(propagated_of(&h, "    x;", "x").as_deref(), Some("int"));
}

#[test]
fn test_hints_follow_propagated_types() {
    let text = "f() {\n  var s = 'x';\n  s.foo();\n}\n";
    let h = resolve_main(text);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_METHOD_HINT), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_METHOD), 0);

    let quiet = resolve_main_with(
        ResolverOptions {
            generate_hints: false,
            ..ResolverOptions::default()
        },
        text,
    );
    assert!(quiet.codes(MAIN).is_empty(), "got {:?}", quiet.codes(MAIN));
}

#[test]
fn test_html_query_propagates_element_class() {
    let mut h = Harness::new().with_html();
    h.add(
        MAIN,
        "import 'dart:html';\nf() {\n  document.querySelector('div');\n  document.querySelector('a');\n  document.querySelector('#id');\n}\n",
    );
    h.resolve(MAIN);
    let div = h.enclosing(MAIN, "querySelector('div')", "querySelector", |k| {
        matches!(k, NodeKind::MethodInvocation { .. })
    });
    assert_eq!(h.static_type_at(MAIN, div), "Element");
    assert_eq!(h.propagated_type_at(MAIN, div).as_deref(), Some("DivElement"));
    let anchor = h.enclosing(MAIN, "querySelector('a')", "querySelector", |k| {
        matches!(k, NodeKind::MethodInvocation { .. })
    });
    assert_eq!(h.best_type_at(MAIN, anchor), "AnchorElement");
    let by_id = h.enclosing(MAIN, "querySelector('#id')", "querySelector", |k| {
        matches!(k, NodeKind::MethodInvocation { .. })
    });
    assert_eq!(h.propagated_type_at(MAIN, by_id), None);
    assert!(h.context.library(&Source::new("dart:html")).is_some());
}

#[test]
fn test_union_receiver_merges_members_of_the_same_shape() {
    let h = resolve_main_with(
        ResolverOptions {
            enable_union_types: true,
            ..ResolverOptions::default()
        },
        "class A {\n  int m(int x) => 0;\n}\nclass B {\n  String m(int x) => '';\n}\nclass C {\n  m(int x, int y) {}\n}\nf(bool c) {\n  var v;\n  if (c) { v = new A(); } else { v = new B(); }\n  v.m(1);\n  var w;\n  if (c) { w = new A(); } else { w = new C(); }\n  w.m(1);\n}\n",
    );
    let merged_name = h.node_in(MAIN, "v.m(1)", "m");
    let merged = h.annotations(MAIN).propagated_element(merged_name);
    assert_eq!(h.model().name(merged), "m");
    assert!(h.model().element(merged).is_some_and(Element::is_synthetic));
    assert_eq!(h.model().parameters(merged).len(), 1);
    assert!(h.annotations(MAIN).static_element(merged_name).is_none());

    // Differing shapes give no member and nothing is reported.
    let differing = h.node_in(MAIN, "w.m(1)", "m");
    assert!(h.annotations(MAIN).propagated_element(differing).is_none());
    assert!(h.annotations(MAIN).static_element(differing).is_none());
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

// =============================================================================
// Promotion
// =============================================================================

#[test]
fn test_is_check_promotes_parameter_in_branch() {
    let h = resolve_main("f(Object x) {\n  if (x is String) {\n    x.length;\n  }\n}\n");
    let x = h.node_in(MAIN, "x.length", "x");
    assert_eq!(h.best_type_at(MAIN, x), "String");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_GETTER), 0);
}

#[test]
fn test_mutation_in_closure_blocks_promotion() {
    let h = resolve_main(
        "f(Object x) {\n  g() { x = 1; }\n  if (x is String) {\n    x.length;\n  }\n}\n",
    );
    let x = h.node_in(MAIN, "x.length", "x");
    assert_eq!(h.best_type_at(MAIN, x), "Object");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_GETTER), 1);
}

#[test]
fn test_closure_access_blocks_promotion_when_mutated_in_scope() {
    let h = resolve_main(
        "f(Object x) {\n  if (x is String) {\n    var g = () => x.length;\n  }\n  x = 1;\n}\n",
    );
    let x = h.node_in(MAIN, "x.length", "x");
    assert_eq!(h.best_type_at(MAIN, x), "Object");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_GETTER), 1);

    let unmutated = resolve_main(
        "f(Object x) {\n  if (x is String) {\n    var g = () => x.length;\n  }\n}\n",
    );
    let x = unmutated.node_in(MAIN, "x.length", "x");
    assert_eq!(unmutated.best_type_at(MAIN, x), "String");
    assert_eq!(unmutated.count(MAIN, diagnostic_codes::UNDEFINED_GETTER), 0);
}

#[test]
fn test_promotion_can_be_disabled() {
    let h = resolve_main_with(
        ResolverOptions {
            enable_type_promotion: false,
            ..ResolverOptions::default()
        },
        "f(Object x) {\n  if (x is String) {\n    x.length;\n  }\n}\n",
    );
    let x = h.node_in(MAIN, "x.length", "x");
    assert_eq!(h.static_type_at(MAIN, x), "Object");
}

// =============================================================================
// Arguments
// =============================================================================

#[test]
fn test_extra_positional_arguments_are_reported_at_first_extra() {
    let h = resolve_main("m(a, b, [c]) {}\nf() {\n  m(1, 2, 3);\n  m(1, 2, 3, 4);\n  m(1);\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::EXTRA_POSITIONAL_ARGUMENTS), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::NOT_ENOUGH_REQUIRED_ARGUMENTS), 1);

    let extra = h
        .context
        .diagnostics(&Source::new(MAIN))
        .iter()
        .find(|d| d.code == diagnostic_codes::EXTRA_POSITIONAL_ARGUMENTS)
        .expect("extra argument reported");
    let call = h.text(MAIN).find("m(1, 2, 3, 4)").expect("call in source");
    assert_eq!(extra.start as usize, call + "m(1, 2, 3, ".len());

    let third = h.node_in(MAIN, "m(1, 2, 3, 4)", "3");
    let c = h.annotations(MAIN).static_parameter(third);
    assert_eq!(h.model().name(c), "c");
    let fourth = h.node_in(MAIN, "m(1, 2, 3, 4)", "4");
    let exact: Vec<String> = ["1", "2", "3"]
        .iter()
        .map(|arg| {
            let node = h.node_in(MAIN, "m(1, 2, 3);", arg);
            h.model().name(h.annotations(MAIN).static_parameter(node)).to_string()
        })
        .collect();
    assert_eq!(exact, vec!["a", "b", "c"]);
    assert!(h.annotations(MAIN).static_parameter(fourth).is_none());
}

#[test]
fn test_method_invocation_records_return_type() {
    let h = resolve_main("f(String s) {\n  s.substring(1);\n}\n");
    let call = h.node_in(MAIN, "s.substring(1)", "s.substring(1)");
    assert_eq!(h.static_type_at(MAIN, call), "String");
    let name = h.element_at(MAIN, "s.substring(1)", "substring");
    assert_eq!(h.qualified(name), "String.substring");
}
