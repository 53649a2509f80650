mod support;

use dres_common::Source;
use dres_common::diagnostics::diagnostic_codes;
use dres_element::{Element, ElementId, ElementKind, TypeData, TypeSystem, find_class};
use dres_syntax::NodeKind;
use support::{Harness, MAIN, resolve_main};

fn class(h: &Harness, name: &str) -> ElementId {
    let library = h.model().library(&Source::new(MAIN)).expect("main resolved");
    find_class(h.model(), library, name).expect("class declared")
}

// =============================================================================
// Names
// =============================================================================

#[test]
fn test_locals_and_parameters_bind_to_declarations() {
    let h = resolve_main("f(int p) {\n  int a = p;\n  a;\n}\n");
    let p = h.element_at(MAIN, "a = p", "p");
    assert_eq!(h.model().kind(p), Some(ElementKind::Parameter));
    assert_eq!(h.model().name(p), "p");
    let a = h.element_at(MAIN, "  a;", "a");
    assert_eq!(h.model().kind(a), Some(ElementKind::LocalVariable));
    let p_node = h.node_in(MAIN, "a = p", "p");
    assert_eq!(h.static_type_at(MAIN, p_node), "int");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_undefined_names_are_reported() {
    let h = resolve_main("f() {\n  nope;\n  nothing();\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_IDENTIFIER), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_FUNCTION), 1);
}

#[test]
fn test_inherited_members_resolve_from_bare_names_and_this() {
    let h = resolve_main(
        "class A {\n  int x;\n  m() {}\n}\nclass B extends A {\n  n() {\n    m();\n    this.m();\n    x;\n  }\n}\n",
    );
    let bare = h.element_at(MAIN, "    m();", "m");
    assert_eq!(h.qualified(bare), "A.m");
    assert_eq!(h.element_at(MAIN, "this.m()", "m"), bare);
    let field = h.element_at(MAIN, "    x;", "x");
    assert_eq!(h.qualified(field), "A.x");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_reference_before_local_declaration() {
    let h = resolve_main("var x = 0;\nf() {\n  x;\n  var x = 1;\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::REFERENCED_BEFORE_DECLARATION), 1);
}

#[test]
fn test_prefixed_import_resolves_through_prefix() {
    let mut h = Harness::new();
    h.add("/app/lib.dart", "library lib;\nclass C {}\nint top() => 0;\n");
    h.add(
        MAIN,
        "import 'lib.dart' as p;\nf() {\n  p.top();\n  new p.C();\n}\n",
    );
    h.resolve(MAIN);
    let top = h.element_at(MAIN, "p.top()", "top");
    assert_eq!(h.model().kind(top), Some(ElementKind::Function));
    assert_eq!(h.model().name(top), "top");
    let prefix = h.element_at(MAIN, "p.top()", "p");
    assert_eq!(h.model().kind(prefix), Some(ElementKind::Prefix));
    let creation = h.enclosing(MAIN, "new p.C()", "C", |k| {
        matches!(k, NodeKind::InstanceCreationExpression { .. })
    });
    assert_eq!(h.static_type_at(MAIN, creation), "C");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));
}

#[test]
fn test_ambiguous_import_is_reported() {
    let mut h = Harness::new();
    h.add("/app/a.dart", "library a;\nclass C {}\n");
    h.add("/app/b.dart", "library b;\nclass C {}\n");
    h.add(MAIN, "import 'a.dart';\nimport 'b.dart';\nf() {\n  C;\n}\n");
    h.resolve(MAIN);
    assert_eq!(h.count(MAIN, diagnostic_codes::AMBIGUOUS_IMPORT), 1);
    assert!(h.element_at(MAIN, "  C;", "C").is_none());
}

// =============================================================================
// Members
// =============================================================================

#[test]
fn test_static_and_instance_member_access_are_checked() {
    let h = resolve_main(
        "class A {\n  static s() {}\n  i() {}\n}\nf(A a) {\n  A.i();\n  a.s();\n  A.s();\n}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::STATIC_ACCESS_TO_INSTANCE_MEMBER), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::INSTANCE_ACCESS_TO_STATIC_MEMBER), 1);
    let s = h.element_at(MAIN, "A.s()", "s");
    assert_eq!(h.qualified(s), "A.s");
}

#[test]
fn test_proxy_suppresses_undefined_members() {
    let h = resolve_main(
        "@proxy\nclass P {}\nclass Q {}\nf(P p, Q q) {\n  p.anything();\n  q.anything();\n}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_METHOD), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::INVALID_ANNOTATION), 0);
}

#[test]
fn test_super_member_and_invalid_super_context() {
    let h = resolve_main(
        "class A {\n  static s() { super.toString(); }\n  m() { super.toString(); }\n}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::SUPER_IN_INVALID_CONTEXT), 1);
    let to_string = h.element_at(MAIN, "m() { super.toString", "toString");
    assert_eq!(h.qualified(to_string), "Object.toString");
}

#[test]
fn test_named_arguments_are_checked() {
    let h = resolve_main("f({a}) {}\ng() {\n  f(a: 1, a: 2);\n  f(b: 1);\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::DUPLICATE_NAMED_ARGUMENT), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::UNDEFINED_NAMED_PARAMETER), 1);
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn test_named_and_missing_constructors() {
    let h = resolve_main(
        "class C {\n  C.named();\n}\nf() {\n  new C.named();\n  new C.other();\n  new C();\n}\n",
    );
    let creation = h.enclosing(MAIN, "new C.named()", "named", |k| {
        matches!(k, NodeKind::InstanceCreationExpression { .. })
    });
    let named = h.model().get_constructor(class(&h, "C"), "named");
    assert!(named.is_some());
    assert_eq!(h.annotations(MAIN).static_element(creation), named);
    assert_eq!(h.element_at(MAIN, "new C.named()", "named"), named);
    assert_eq!(h.count(MAIN, diagnostic_codes::NEW_WITH_UNDEFINED_CONSTRUCTOR), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::NEW_WITH_UNDEFINED_CONSTRUCTOR_DEFAULT), 1);
}

#[test]
fn test_field_initializers_name_declared_fields() {
    let h = resolve_main("class A {\n  int x;\n  A() : x = 1, y = 2;\n}\n");
    assert_eq!(h.count(MAIN, diagnostic_codes::INITIALIZER_FOR_NON_EXISTENT_FIELD), 1);
    let x = h.element_at(MAIN, "x = 1", "x");
    assert_eq!(h.model().kind(x), Some(ElementKind::Field));
    assert_eq!(h.qualified(x), "A.x");
}

// =============================================================================
// Statements and annotations
// =============================================================================

#[test]
fn test_labels_and_jump_targets() {
    let h = resolve_main(
        "f() {\n  outer: while (true) {\n    break outer;\n    continue missing;\n  }\n  break;\n  inner: while (true) {\n    g() { break inner; }\n  }\n}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::LABEL_UNDEFINED), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::LABEL_IN_OUTER_SCOPE), 1);
    assert_eq!(h.count(MAIN, diagnostic_codes::BREAK_OUTSIDE_LOOP), 1);
    let label = h.element_at(MAIN, "break outer", "outer");
    assert_eq!(h.model().kind(label), Some(ElementKind::Label));
}

#[test]
fn test_annotations_must_be_constants() {
    let h = resolve_main(
        "const ok = 1;\nvar notConst = 1;\n@ok\nf() {}\n@notConst\ng() {}\n@undefinedThing\nh() {}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::INVALID_ANNOTATION), 2);
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn test_inconsistent_interface_inheritance() {
    let h = resolve_main(
        "abstract class I {\n  m(a);\n}\nabstract class J {\n  m(a, b);\n}\nabstract class K implements I, J {}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::INCONSISTENT_METHOD_INHERITANCE), 1);

    let provider = h.context.provider().expect("core resolved");
    let ts = TypeSystem::new(h.model(), provider);
    let library = h.context.library(&Source::new(MAIN)).expect("main resolved");
    let k = class(&h, "K");
    assert!(library.inheritance.lookup_member(&ts, k, "m").is_none());
    let conflicts = library.inheritance.conflicts(&ts, k);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].name, "m");
    assert_eq!(conflicts[0].members.len(), 2);
}

#[test]
fn test_mixin_and_interface_with_same_signature_agree() {
    let h = resolve_main(
        "abstract class B {\n  foo();\n}\nabstract class C {\n  foo();\n}\nabstract class A extends Object with B implements C {}\n",
    );
    assert_eq!(h.count(MAIN, diagnostic_codes::INCONSISTENT_METHOD_INHERITANCE), 0);

    let provider = h.context.provider().expect("core resolved");
    let ts = TypeSystem::new(h.model(), provider);
    let library = h.context.library(&Source::new(MAIN)).expect("main resolved");
    let a = class(&h, "A");
    let members = library.inheritance.members_inherited_from_interfaces(&ts, a);
    assert_eq!(members.keys().filter(|k| k.as_str() == "foo").count(), 1);
    assert!(library.inheritance.conflicts(&ts, a).is_empty());
    // The mixin shadows the superclass chain.
    let chain = library.inheritance.members_inherited_from_classes(&ts, a);
    let foo = chain.get("foo").copied().expect("mixed in");
    assert_eq!(h.qualified(foo), "B.foo");
}

#[test]
fn test_member_types_are_substituted_along_the_inheritance_path() {
    let h = resolve_main(
        "class A<T> {\n  T get value => null;\n  T m() => null;\n}\nclass B<S> extends A<S> {}\nclass C extends B<int> {}\nabstract class M<U> {\n  U get mixed;\n}\nabstract class I<V> {\n  V get declared;\n}\nabstract class D extends Object with M<String> implements I<double> {}\nf(C c, D d) {\n  c.value;\n  c.m();\n  d.mixed;\n  d.declared;\n}\n",
    );
    let static_of = |text: &str| {
        let node = h.node_in(MAIN, text, text);
        h.static_type_at(MAIN, node)
    };
    assert_eq!(static_of("c.value"), "int");
    assert_eq!(static_of("c.m()"), "int");
    assert_eq!(static_of("d.mixed"), "String");
    assert_eq!(static_of("d.declared"), "double");
    assert!(h.codes(MAIN).is_empty(), "got {:?}", h.codes(MAIN));

    let provider = h.context.provider().expect("core resolved");
    let ts = TypeSystem::new(h.model(), provider);
    let library = h.context.library(&Source::new(MAIN)).expect("main resolved");
    let c_type = h
        .model()
        .element(class(&h, "C"))
        .and_then(Element::as_class)
        .map(|data| data.this_type)
        .expect("class data");
    let (member, ty) = library
        .inheritance
        .lookup_member_type(&ts, c_type, "m")
        .expect("inherited from A");
    assert_eq!(h.qualified(member), "A.m");
    let Some(TypeData::Function { return_type, .. }) = h.model().types.lookup(ty) else {
        panic!("method type expected");
    };
    assert_eq!(h.type_name(return_type), "int");
}

#[test]
fn test_inherited_lookups_agree_with_cached_maps() {
    let h = resolve_main(
        "class A {\n  a() {}\n}\nabstract class I {\n  i();\n}\nabstract class B extends A implements I {}\n",
    );
    let provider = h.context.provider().expect("core resolved");
    let ts = TypeSystem::new(h.model(), provider);
    let library = h.context.library(&Source::new(MAIN)).expect("main resolved");
    let b = class(&h, "B");
    for _ in 0..2 {
        let chained = library.inheritance.lookup_inherited(&ts, b, "a");
        assert_eq!(h.qualified(chained), "A.a");
        let declared = library.inheritance.lookup_member(&ts, b, "i");
        assert_eq!(h.qualified(declared), "I.i");
        assert!(library.inheritance.lookup_member(&ts, b, "missing").is_none());
    }
    let chain = library.inheritance.members_inherited_from_classes(&ts, b);
    assert_eq!(chain.get("a").copied(), Some(library.inheritance.lookup_inherited(&ts, b, "a")));
    assert!(!chain.contains_key("i"));
    let interfaces = library.inheritance.members_inherited_from_interfaces(&ts, b);
    assert_eq!(interfaces.get("i").copied(), Some(library.inheritance.lookup_member(&ts, b, "i")));
}
