mod support;

use dres_binder::{Lookup, LibraryScope, Namespace, NamespaceBuilder, UNARY_MINUS};
use dres_common::diagnostics::diagnostic_codes;
use dres_common::DiagnosticCollector;
use dres_element::{Combinator, Element, ElementFlags, ElementId, ElementKind};
use dres_syntax::NodeKind;
use support::{Fixture, find};

#[test]
fn test_class_members_are_built() {
    let mut fx = Fixture::new();
    let lib = fx.build_one(
        "/app/a.dart",
        "class A {\n  int x;\n  final y = 1;\n  A(this.x);\n  A.named();\n  m(a, [b], {c}) {}\n  get g => 1;\n  set s(v) {}\n  operator -() => this;\n  operator -(o) => this;\n  static sm() {}\n}\n",
    );
    let a = fx.class(lib, "A");
    let data = fx.model.element(a).and_then(Element::as_class).expect("class data").clone();

    assert_eq!(fx.names(&data.constructors), vec!["", "named"]);
    let mut methods = fx.names(&data.methods);
    methods.sort();
    assert_eq!(methods, vec!["-", "m", "sm", UNARY_MINUS]);
    let mut accessors = fx.names(&data.accessors);
    accessors.sort();
    assert_eq!(accessors, vec!["g", "s=", "x", "x=", "y"], "final field has no setter");

    // Explicit accessors get synthetic fields.
    let g_field = fx.model.get_field(a, "g");
    assert!(fx.model.has_flag(g_field, ElementFlags::SYNTHETIC));
    assert!(!fx.model.has_flag(fx.model.get_field(a, "x"), ElementFlags::SYNTHETIC));

    let ctor = fx.model.get_constructor(a, "");
    let param = fx.model.parameters(ctor)[0];
    let pdata = fx.model.element(param).and_then(Element::as_parameter).expect("parameter");
    assert!(pdata.is_initializing_formal);
    assert_eq!(pdata.field, fx.model.get_field(a, "x"));

    let sm = fx.model.get_method(a, "sm");
    assert!(fx.model.has_flag(sm, ElementFlags::STATIC));
    let unary = fx.model.get_method(a, UNARY_MINUS);
    assert!(fx.model.parameters(unary).is_empty());
    assert_eq!(fx.model.parameters(fx.model.get_method(a, "-")).len(), 1);
    assert!(fx.diagnostics.is_empty());
}

#[test]
fn test_parameter_kinds_follow_declaration() {
    let mut fx = Fixture::new();
    let lib = fx.build_one("/app/a.dart", "f(a, [b = 1], {c}) {}\ng(h(int x)) {}\n");
    let unit = fx.defining_unit(lib);
    let functions = fx.model.element(unit).and_then(Element::as_unit).expect("unit").functions.clone();
    assert_eq!(fx.names(&functions), vec!["f", "g"]);

    let kinds: Vec<_> = fx
        .model
        .parameters(functions[0])
        .iter()
        .map(|&p| fx.model.element(p).and_then(Element::as_parameter).map(|d| (d.kind, d.has_default)))
        .collect();
    use dres_syntax::ParameterKind::*;
    assert_eq!(kinds, vec![Some((Required, false)), Some((Positional, true)), Some((Named, false))]);

    let h = fx.model.parameters(functions[1])[0];
    assert_eq!(fx.names(fx.model.parameters(h)), vec!["x"]);
}

#[test]
fn test_synthetic_default_constructor() {
    let mut fx = Fixture::new();
    let lib = fx.build_one("/app/a.dart", "class B {}\n");
    let b = fx.class(lib, "B");
    let ctor = fx.model.get_constructor(b, "");
    let element = fx.model.element(ctor).expect("default constructor");
    assert!(element.is_synthetic());
    assert_eq!(element.name_offset, fx.model.element(b).map(|e| e.name_offset).unwrap_or(0));
}

#[test]
fn test_top_level_declarations() {
    let mut fx = Fixture::new();
    let lib = fx.build_one(
        "/app/a.dart",
        "var a = 1;\nconst b = 2;\nf() {}\nget g => 0;\nset g(v) {}\ntypedef int F<T>(T x);\nclass M = Object with N;\n",
    );
    let unit = fx.defining_unit(lib);
    let data = fx.model.element(unit).and_then(Element::as_unit).expect("unit").clone();
    assert_eq!(fx.names(&data.top_level_variables), vec!["a", "b", "g"]);
    assert_eq!(fx.names(&data.accessors), vec!["a", "a=", "b", "g", "g="]);
    assert_eq!(fx.names(&data.functions), vec!["f"]);
    assert_eq!(fx.names(&data.function_type_aliases), vec!["F"]);
    let alias = data.function_type_aliases[0];
    assert_eq!(fx.model.type_parameters(alias).len(), 1);
    assert_eq!(fx.model.parameters(alias).len(), 1);

    let b = data.top_level_variables[1];
    assert!(fx.model.has_flag(b, ElementFlags::CONST));
    let m = fx.class(lib, "M");
    assert!(fx.model.has_flag(m, ElementFlags::MIXIN_APPLICATION));

    // The implicit setter parameter.
    let setter = data.accessors[1];
    assert_eq!(fx.names(fx.model.parameters(setter)), vec!["_a"]);
}

#[test]
fn test_locals_labels_and_closures() {
    let mut fx = Fixture::new();
    let lib = fx.build_one(
        "/app/a.dart",
        "f() {\n  var x = 1;\n  L: for (var i in []) {}\n  try {} catch (e, s) {}\n  g() {}\n  var c = (p) => p;\n  switch (1) { M: case 1: break; }\n}\n",
    );
    let unit = fx.defining_unit(lib);
    let f = fx.model.element(unit).and_then(Element::as_unit).expect("unit").functions[0];
    let data = fx.model.element(f).and_then(Element::as_executable).expect("function").clone();

    assert_eq!(fx.names(&data.local_variables), vec!["x", "i", "e", "s", "c"]);
    assert_eq!(fx.names(&data.labels), vec!["L", "M"]);
    let on_switch: Vec<bool> = data
        .labels
        .iter()
        .map(|&l| match fx.model.element(l).map(|e| &e.data) {
            Some(dres_element::ElementData::Label(d)) => d.on_switch_member,
            _ => false,
        })
        .collect();
    assert_eq!(on_switch, vec![false, true]);

    assert_eq!(fx.names(&data.local_functions), vec!["g", ""]);
    let closure = data.local_functions[1];
    assert!(fx.model.has_flag(closure, ElementFlags::LOCAL));
    assert_eq!(fx.names(fx.model.parameters(closure)), vec!["p"]);

    let unit_tree = fx.unit("/app/a.dart");
    let closure_node = find(unit_tree, |k| matches!(k, NodeKind::FunctionExpression { body, .. } if unit_tree.arena.kind(*body).is_some_and(|b| matches!(b, NodeKind::ExpressionFunctionBody { .. }))));
    assert_eq!(fx.annotations("/app/a.dart").declared_element(closure_node), closure);
}

#[test]
fn test_field_initializer_closure_gets_initializer_function() {
    let mut fx = Fixture::new();
    let lib = fx.build_one("/app/a.dart", "class C {\n  var f = () => 1;\n  var n = 0;\n}\n");
    let c = fx.class(lib, "C");
    let field = fx.model.get_field(c, "f");
    let init = fx.model.element(field).and_then(Element::as_variable).expect("field").initializer;
    assert!(init.is_some());
    assert!(fx.model.has_flag(init, ElementFlags::SYNTHETIC));
    let closures = fx.model.element(init).and_then(Element::as_executable).expect("initializer").local_functions.clone();
    assert_eq!(closures.len(), 1);

    let plain = fx.model.get_field(c, "n");
    assert!(fx.model.element(plain).and_then(Element::as_variable).expect("field").initializer.is_none());
}

#[test]
fn test_declarations_are_annotated() {
    let mut fx = Fixture::new();
    let lib = fx.build_one("/app/a.dart", "class A { m() {} }\n");
    let unit = fx.unit("/app/a.dart");
    let class_node = find(unit, |k| matches!(k, NodeKind::ClassDeclaration { .. }));
    let method_node = find(unit, |k| matches!(k, NodeKind::MethodDeclaration { .. }));
    let annotations = fx.annotations("/app/a.dart");
    let a = fx.class(lib, "A");
    assert_eq!(annotations.declared_element(class_node), a);
    assert_eq!(annotations.declared_element(method_node), fx.model.get_method(a, "m"));
    let Some(NodeKind::ClassDeclaration { name, .. }) = unit.arena.kind(class_node) else {
        panic!("class expected");
    };
    assert_eq!(annotations.static_element(*name), a);
}

#[test]
fn test_directives_parts_and_prefixes() {
    let mut fx = Fixture::new();
    fx.add("/app/b.dart", "library b;\nclass X {}\nclass Y {}\n");
    fx.add("/app/part.dart", "part of l;\nclass P {}\n");
    fx.add(
        "/app/a.dart",
        "library l;\nimport 'b.dart' as p show X;\nexport 'b.dart' hide Y;\npart 'part.dart';\n",
    );
    let libs = fx.build(&["/app/b.dart", "/app/a.dart"]);
    let (b, a) = (libs[0], libs[1]);
    let data = fx.model.element(a).and_then(Element::as_library).expect("library").clone();

    assert_eq!(data.imports.len(), 2, "explicit import plus implicit dart:core");
    let import = fx.model.element(data.imports[0]).and_then(Element::as_import).expect("import").clone();
    assert_eq!(import.imported_library, b);
    assert_eq!(import.combinators, vec![Combinator::Show(vec!["X".to_string()])]);
    assert_eq!(fx.names(&data.prefixes), vec!["p"]);
    assert_eq!(import.prefix, data.prefixes[0]);
    assert!(fx.model.has_flag(data.imports[1], ElementFlags::SYNTHETIC));

    assert_eq!(fx.model.library_units(a).len(), 2);
    assert!(fx.class(a, "P").is_some());
    assert!(data.load_library.is_some());
    assert!(fx.diagnostics.is_empty(), "{:?}", fx.diagnostics.diagnostics);

    let namespaces = NamespaceBuilder::new(&fx.model);
    let exported = namespaces.export_namespace(a);
    assert!(exported.contains("X"));
    assert!(!exported.contains("Y"));
    assert!(exported.contains("P"));
    let prefixed = namespaces.prefixed_namespace(data.prefixes[0]);
    assert_eq!(prefixed.len(), 1);
    assert!(prefixed[0].1.contains("X"));
    assert!(!prefixed[0].1.contains("Y"));
}

#[test]
fn test_directive_diagnostics() {
    let mut fx = Fixture::new();
    fx.add("/app/notpart.dart", "class Q {}\n");
    fx.add("/app/p.dart", "part of other;\n");
    fx.add(
        "/app/a.dart",
        "library l;\nimport 'missing.dart';\nimport 'p.dart';\nexport 'p.dart';\npart 'notpart.dart';\npart 'p.dart';\n",
    );
    fx.build(&["/app/a.dart"]);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::URI_DOES_NOT_EXIST), 1);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::IMPORT_OF_NON_LIBRARY), 1);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::EXPORT_OF_NON_LIBRARY), 1);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::PART_OF_NON_PART), 1);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::PART_OF_DIFFERENT_LIBRARY), 1);
}

#[test]
fn test_deferred_import_without_deferred_loading() {
    let mut fx = Fixture::new();
    fx.deferred_loading = false;
    fx.add("/app/b.dart", "library b;\n");
    fx.add("/app/a.dart", "import 'b.dart' deferred as d;\n");
    let libs = fx.build(&["/app/b.dart", "/app/a.dart"]);
    assert_eq!(fx.diagnostics.count(diagnostic_codes::DEFERRED_LOADING_DISABLED), 1);
    let data = fx.model.element(libs[1]).and_then(Element::as_library).expect("library");
    assert!(data.load_library.is_none());
}

#[test]
fn test_export_cycle_terminates() {
    let mut fx = Fixture::new();
    fx.add("/app/a.dart", "export 'b.dart';\nclass A {}\nclass _Hidden {}\n");
    fx.add("/app/b.dart", "export 'a.dart';\nclass B {}\n");
    let libs = fx.build(&["/app/a.dart", "/app/b.dart"]);
    let namespace = NamespaceBuilder::new(&fx.model).export_namespace(libs[0]);
    let mut names: Vec<&str> = namespace.iter().map(|(n, _)| n).collect();
    names.sort();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_library_scope_reports_ambiguity_and_duplicates() {
    let mut fx = Fixture::new();
    fx.add("/app/x.dart", "class C {}\n");
    fx.add("/app/y.dart", "class C {}\n");
    fx.add("/app/a.dart", "import 'x.dart';\nimport 'y.dart';\nclass D {}\nD() {}\n");
    let libs = fx.build(&["/app/x.dart", "/app/y.dart", "/app/a.dart"]);
    let mut sink = DiagnosticCollector::new();
    let scope = LibraryScope::new(&fx.model, libs[2], &mut sink);
    assert_eq!(sink.count(diagnostic_codes::DUPLICATE_DEFINITION), 1);
    match scope.lookup(&fx.model, "C") {
        Lookup::Ambiguous(elements) => assert_eq!(elements.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert!(matches!(scope.lookup(&fx.model, "D"), Lookup::Found(_)));
    assert_eq!(scope.lookup(&fx.model, "Missing"), Lookup::NotFound);
}

#[test]
fn test_namespace_combinators_cover_setters() {
    let mut ns = Namespace::new();
    ns.define("v", ElementId(1));
    ns.define("v=", ElementId(2));
    ns.define("w", ElementId(3));
    let shown = ns.filtered(&[Combinator::Show(vec!["v".to_string()])]);
    assert_eq!(shown.len(), 2);
    let hidden = ns.filtered(&[Combinator::Hide(vec!["v".to_string()])]);
    assert_eq!(hidden.len(), 1);
    assert_eq!(ns.define("w", ElementId(4)), Some(ElementId(3)));
    assert!(ElementKind::Getter.is_accessor());
}
