use dres_common::Source;
use dres_parser::parse_unit;
use dres_syntax::{
    NodeIndex, NodeKind, Operator, ParameterKind, ParameterShape, ParsedUnit, PropertyKind,
    VarKeyword,
};

fn parse(text: &str) -> ParsedUnit {
    parse_unit(Source::new("file:///test.dart"), text).expect("fixture should parse")
}

/// First node in preorder whose kind satisfies `pred`.
fn find(unit: &ParsedUnit, pred: impl Fn(&NodeKind) -> bool) -> NodeIndex {
    unit.arena
        .descendants(unit.root)
        .into_iter()
        .find(|&idx| unit.arena.kind(idx).is_some_and(&pred))
        .expect("node present")
}

fn text_of<'a>(unit: &ParsedUnit, text: &'a str, idx: NodeIndex) -> &'a str {
    &text[unit.arena.offset(idx) as usize..unit.arena.end(idx) as usize]
}

#[test]
fn test_directives() {
    let unit = parse(
        "library a.b;\nimport 'dart:math' as m show max hide min;\nimport 'x.dart' deferred as d;\nexport 'y.dart';\npart 'p.dart';\n",
    );
    assert_eq!(unit.directives().len(), 5);
    assert_eq!(unit.library_name().as_deref(), Some("a.b"));
    let uris: Vec<String> = unit
        .referenced_library_uris()
        .into_iter()
        .map(|(_, uri)| uri)
        .collect();
    assert_eq!(uris, vec!["dart:math", "x.dart", "y.dart"]);
    assert_eq!(unit.part_uris().len(), 1);

    let deferred = find(&unit, |k| {
        matches!(k, NodeKind::ImportDirective { deferred: true, .. })
    });
    let Some(NodeKind::ImportDirective { prefix, .. }) = unit.arena.kind(deferred) else {
        panic!("import expected");
    };
    assert_eq!(unit.arena.identifier_name(*prefix), Some("d"));
}

#[test]
fn test_part_of() {
    let unit = parse("part of a.b;\nclass C {}\n");
    assert!(unit.is_part());
    assert_eq!(unit.part_of_name().as_deref(), Some("a.b"));
}

#[test]
fn test_class_members() {
    let text = "abstract class A<T extends num> extends B with M implements I, J {\n  int x = 1, y;\n  static const z = 2;\n  A(this.x, [int y = 0]);\n  A.named({this.y}) : x = 3, super();\n  factory A.make() = C<T>.other;\n  int get value => x;\n  set value(int v) {}\n  operator [](int i) => i;\n  operator []=(int i, v) {}\n  A operator -() => this;\n  bool operator ==(other) => true;\n  void m(String s, f(int a));\n}\n";
    let unit = parse(text);
    let class = find(&unit, |k| matches!(k, NodeKind::ClassDeclaration { .. }));
    let Some(NodeKind::ClassDeclaration {
        is_abstract,
        type_parameters,
        implements,
        members,
        ..
    }) = unit.arena.kind(class)
    else {
        panic!("class expected");
    };
    assert!(*is_abstract);
    assert_eq!(type_parameters.len(), 1);
    assert_eq!(implements.len(), 2);
    assert_eq!(members.len(), 12);

    let kinds: Vec<&str> = members
        .iter()
        .map(|m| unit.arena.kind(m).map_or("?", NodeKind::name))
        .collect();
    assert_eq!(
        kinds,
        vec![
            "FieldDeclaration",
            "FieldDeclaration",
            "ConstructorDeclaration",
            "ConstructorDeclaration",
            "ConstructorDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
            "MethodDeclaration",
        ]
    );

    let getter = find(&unit, |k| {
        matches!(k, NodeKind::MethodDeclaration { property_kind: PropertyKind::Get, .. })
    });
    assert_eq!(text_of(&unit, text, getter), "int get value => x;");

    let index_set = find(&unit, |k| {
        matches!(k, NodeKind::MethodDeclaration { is_operator: true, name, .. } if *name != NodeIndex::NONE)
    });
    let Some(NodeKind::MethodDeclaration { name, .. }) = unit.arena.kind(index_set) else {
        panic!("operator expected");
    };
    assert_eq!(unit.arena.identifier_name(*name), Some("[]"));

    let factory = find(&unit, |k| {
        matches!(k, NodeKind::ConstructorDeclaration { is_factory: true, .. })
    });
    let Some(NodeKind::ConstructorDeclaration { redirected, .. }) = unit.arena.kind(factory) else {
        panic!("factory expected");
    };
    assert!(redirected.is_some());
}

#[test]
fn test_constructor_initializers() {
    let unit = parse("class A extends B {\n  var x;\n  A() : this.x = 1, super.named(2);\n  A.other() : this();\n}\n");
    let field_init = find(&unit, |k| {
        matches!(k, NodeKind::ConstructorFieldInitializer { has_this: true, .. })
    });
    assert!(field_init.is_some());
    let super_call = find(&unit, |k| matches!(k, NodeKind::SuperConstructorInvocation { .. }));
    let Some(NodeKind::SuperConstructorInvocation { constructor_name, .. }) =
        unit.arena.kind(super_call)
    else {
        panic!("super call expected");
    };
    assert_eq!(unit.arena.identifier_name(*constructor_name), Some("named"));
    find(&unit, |k| matches!(k, NodeKind::RedirectingConstructorInvocation { .. }));
}

#[test]
fn test_formal_parameter_shapes() {
    let unit = parse("f(a, int b, [c = 1, d]) {}\ng(this.x, h(int y), {int z: 2}) {}\n");
    let positional: Vec<NodeIndex> = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| {
            matches!(
                unit.arena.kind(n),
                Some(NodeKind::FormalParameter { kind: ParameterKind::Positional, .. })
            )
        })
        .collect();
    assert_eq!(positional.len(), 2);
    find(&unit, |k| {
        matches!(k, NodeKind::FormalParameter { shape: ParameterShape::Field, .. })
    });
    find(&unit, |k| {
        matches!(k, NodeKind::FormalParameter { shape: ParameterShape::FunctionTyped, .. })
    });
    let named = find(&unit, |k| {
        matches!(k, NodeKind::FormalParameter { kind: ParameterKind::Named, .. })
    });
    let Some(NodeKind::FormalParameter { default_value, .. }) = unit.arena.kind(named) else {
        panic!("named parameter expected");
    };
    assert!(default_value.is_some());
}

#[test]
fn test_top_level_variables_and_typedefs() {
    let unit = parse("final a = 1;\nint b, c = 2;\ntypedef int F(int x);\ntypedef G();\nclass M = Object with N;\nget g => 1;\n");
    assert_eq!(unit.declarations().len(), 6);
    let list = find(&unit, |k| {
        matches!(k, NodeKind::VariableDeclarationList { keyword: VarKeyword::Final, .. })
    });
    assert!(list.is_some());
    find(&unit, |k| matches!(k, NodeKind::ClassTypeAlias { .. }));
    find(&unit, |k| {
        matches!(k, NodeKind::FunctionDeclaration { property_kind: PropertyKind::Get, .. })
    });
}

#[test]
fn test_statements() {
    let text = "main() {\n  var i = 0;\n  int j;\n  outer: for (var k = 0; k < 3; k++) {\n    for (final e in list) { continue outer; }\n    for (e in list) break;\n  }\n  while (i < 3) i++;\n  do { i--; } while (i > 0);\n  switch (i) { l: case 1: break; default: return; }\n  try { throw 1; } on String catch (e, s) {} catch (e) { rethrow; } finally {}\n  local(x) => x;\n  int typed() { return 1; }\n  if (i is! int) {} else if (i == 1) {}\n  assert(i != null);\n}\n";
    let unit = parse(text);
    for name in [
        "LabeledStatement",
        "ForStatement",
        "ForEachStatement",
        "WhileStatement",
        "DoStatement",
        "SwitchCase",
        "SwitchDefault",
        "TryStatement",
        "CatchClause",
        "ContinueStatement",
        "BreakStatement",
        "RethrowExpression",
        "ThrowExpression",
        "FunctionDeclarationStatement",
        "AssertStatement",
        "IsExpression",
    ] {
        find(&unit, |k| k.name() == name);
    }
    let catches = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| matches!(unit.arena.kind(n), Some(NodeKind::CatchClause { .. })))
        .count();
    assert_eq!(catches, 2);
    let case = find(&unit, |k| matches!(k, NodeKind::SwitchCase { .. }));
    let Some(NodeKind::SwitchCase { labels, .. }) = unit.arena.kind(case) else {
        panic!("case expected");
    };
    assert_eq!(labels.len(), 1);
}

#[test]
fn test_selector_shapes() {
    let unit = parse("main() { a.b; a.b.c; a.m(); f(1); (f)(2); x[0] = 1; this.y; super.z(); }\n");
    let prefixed = find(&unit, |k| matches!(k, NodeKind::PrefixedIdentifier { .. }));
    assert!(prefixed.is_some());
    let access = find(&unit, |k| matches!(k, NodeKind::PropertyAccess { .. }));
    let Some(NodeKind::PropertyAccess { target, .. }) = unit.arena.kind(access) else {
        panic!("property access expected");
    };
    assert!(matches!(
        unit.arena.kind(*target),
        Some(NodeKind::PrefixedIdentifier { .. })
    ));
    let untargeted = find(&unit, |k| {
        matches!(k, NodeKind::MethodInvocation { target, .. } if target.is_none())
    });
    assert!(untargeted.is_some());
    find(&unit, |k| matches!(k, NodeKind::FunctionExpressionInvocation { .. }));
    let assign = find(&unit, |k| matches!(k, NodeKind::AssignmentExpression { .. }));
    let Some(NodeKind::AssignmentExpression { left, .. }) = unit.arena.kind(assign) else {
        panic!("assignment expected");
    };
    assert!(matches!(
        unit.arena.kind(*left),
        Some(NodeKind::IndexExpression { .. })
    ));
}

#[test]
fn test_precedence() {
    let text = "main() { x = a + b * c < d || e && !f; }\n";
    let unit = parse(text);
    let or = find(&unit, |k| {
        matches!(k, NodeKind::BinaryExpression { operator: Operator::BarBar, .. })
    });
    assert_eq!(text_of(&unit, text, or), "a + b * c < d || e && !f");
    let plus = find(&unit, |k| {
        matches!(k, NodeKind::BinaryExpression { operator: Operator::Plus, .. })
    });
    assert_eq!(text_of(&unit, text, plus), "a + b * c");
    find(&unit, |k| {
        matches!(k, NodeKind::PrefixExpression { operator: Operator::Bang, .. })
    });
}

#[test]
fn test_literals() {
    let text = "main() { var l = const <int>[1, 2]; var m = {'a': 1.5}; var s = 'x' \"y\"; var t = 'v=$v, w=${w + 1}'; var y = #a.b; var n = null; }\n";
    let unit = parse(text);
    let list = find(&unit, |k| matches!(k, NodeKind::ListLiteral { .. }));
    let Some(NodeKind::ListLiteral {
        is_const,
        type_arguments,
        elements,
    }) = unit.arena.kind(list)
    else {
        panic!("list expected");
    };
    assert!(*is_const);
    assert_eq!(type_arguments.len(), 1);
    assert_eq!(elements.len(), 2);
    find(&unit, |k| matches!(k, NodeKind::MapLiteralEntry { .. }));
    find(&unit, |k| matches!(k, NodeKind::DoubleLiteral { .. }));
    let adjacent = find(&unit, |k| matches!(k, NodeKind::AdjacentStrings { .. }));
    assert_eq!(unit.arena.string_value(adjacent).as_deref(), Some("xy"));

    let interpolation = find(&unit, |k| matches!(k, NodeKind::StringInterpolation { .. }));
    let Some(NodeKind::StringInterpolation { elements }) = unit.arena.kind(interpolation) else {
        panic!("interpolation expected");
    };
    assert_eq!(elements.len(), 4);
    let w = find(&unit, |k| matches!(k, NodeKind::SimpleIdentifier { name } if name == "w"));
    assert_eq!(text_of(&unit, text, w), "w");
    let v = find(&unit, |k| matches!(k, NodeKind::SimpleIdentifier { name } if name == "v"));
    assert_eq!(text_of(&unit, text, v), "v");

    let symbol = find(&unit, |k| matches!(k, NodeKind::SymbolLiteral { .. }));
    let Some(NodeKind::SymbolLiteral { components }) = unit.arena.kind(symbol) else {
        panic!("symbol expected");
    };
    assert_eq!(components, &vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_instance_creation_and_cascades() {
    let unit = parse("main() { new A(); const p.B.c(1); new C<int>.d(); new A()..x = 1..m(); }\n");
    let creations = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| {
            matches!(
                unit.arena.kind(n),
                Some(NodeKind::InstanceCreationExpression { .. })
            )
        })
        .count();
    assert_eq!(creations, 4);
    let cascade = find(&unit, |k| matches!(k, NodeKind::CascadeExpression { .. }));
    let Some(NodeKind::CascadeExpression { sections, .. }) = unit.arena.kind(cascade) else {
        panic!("cascade expected");
    };
    assert_eq!(sections.len(), 2);
    find(&unit, |k| {
        matches!(k, NodeKind::PropertyAccess { is_cascaded: true, target, .. } if target.is_none())
    });
    let named = find(&unit, |k| {
        matches!(k, NodeKind::ConstructorName { name, .. } if name.is_some())
    });
    assert!(named.is_some());
}

#[test]
fn test_function_expressions_and_named_arguments() {
    let unit = parse("main() { f((a) => a, b: (x) { return x; }, c: 1 > 0 ? 1 : 2); }\n");
    let functions = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| matches!(unit.arena.kind(n), Some(NodeKind::FunctionExpression { .. })))
        .count();
    // main plus the two closures
    assert_eq!(functions, 3);
    let named = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| matches!(unit.arena.kind(n), Some(NodeKind::NamedExpression { .. })))
        .count();
    assert_eq!(named, 2);
    find(&unit, |k| matches!(k, NodeKind::ConditionalExpression { .. }));
}

#[test]
fn test_annotations() {
    let unit = parse("@proxy\n@p.A(1)\n@p.A.named()\nclass C {}\n");
    let class = find(&unit, |k| matches!(k, NodeKind::ClassDeclaration { .. }));
    let metadata = unit
        .arena
        .kind(class)
        .and_then(NodeKind::metadata)
        .expect("class metadata");
    assert_eq!(metadata.len(), 3);
    let third = metadata.last().expect("third annotation");
    let Some(NodeKind::Annotation {
        constructor_name,
        arguments,
        ..
    }) = unit.arena.kind(third)
    else {
        panic!("annotation expected");
    };
    assert_eq!(unit.arena.identifier_name(*constructor_name), Some("named"));
    assert!(arguments.is_some());
}

#[test]
fn test_parameter_annotations_are_kept() {
    let text = "f(@deprecated int a, [@p.A(1) b]) {}\n";
    let unit = parse(text);
    let parameters: Vec<NodeIndex> = unit
        .arena
        .descendants(unit.root)
        .into_iter()
        .filter(|&n| matches!(unit.arena.kind(n), Some(NodeKind::FormalParameter { .. })))
        .collect();
    assert_eq!(parameters.len(), 2);
    for &parameter in &parameters {
        let metadata = unit
            .arena
            .kind(parameter)
            .and_then(NodeKind::metadata)
            .expect("parameter metadata");
        assert_eq!(metadata.len(), 1);
        let annotation = metadata.first().expect("annotation");
        assert_eq!(unit.arena.parent(annotation), parameter);
    }
    assert_eq!(text_of(&unit, text, parameters[0]), "int a");
}

#[test]
fn test_nested_generic_close() {
    let unit = parse("Map<String, List<int>> m;\n");
    let outer = find(&unit, |k| matches!(k, NodeKind::TypeName { type_arguments, .. } if type_arguments.len() == 2));
    assert!(outer.is_some());
}

#[test]
fn test_parents_are_linked() {
    let unit = parse("class A { m() { return 1; } }\n");
    let literal = find(&unit, |k| matches!(k, NodeKind::IntegerLiteral { .. }));
    let method = unit
        .arena
        .find_ancestor_or_self(literal, |k| matches!(k, NodeKind::MethodDeclaration { .. }));
    assert!(method.is_some());
    assert_eq!(unit.arena.ancestors(literal).last(), Some(unit.root));
}

#[test]
fn test_syntax_error_reports_offset() {
    let err = parse_unit(Source::new("file:///bad.dart"), "class {").expect_err("should fail");
    assert_eq!(err.offset, 6);
}
