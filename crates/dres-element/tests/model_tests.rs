use super::*;
use crate::element::{ClassData, ExecutableData, ExecutableKind, LibraryData, UnitData, VariableData, VariableKind};

fn library_with_class() -> (ElementModel, ElementId, ElementId) {
    let mut model = ElementModel::new();
    let source = Source::new("/lib/a.dart");
    let library = model.elements.add(
        Element::new(
            "a",
            0,
            ElementData::Library(LibraryData {
                source: source.clone(),
                defining_unit: ElementId::NONE,
                parts: Vec::new(),
                imports: Vec::new(),
                exports: Vec::new(),
                prefixes: Vec::new(),
                load_library: ElementId::NONE,
            }),
        ),
        ElementId::NONE,
    );
    let unit = model.elements.add(
        Element::new(
            "",
            0,
            ElementData::CompilationUnit(UnitData {
                source: source.clone(),
                classes: Vec::new(),
                function_type_aliases: Vec::new(),
                functions: Vec::new(),
                top_level_variables: Vec::new(),
                accessors: Vec::new(),
            }),
        ),
        library,
    );
    let class = model
        .elements
        .add(Element::new("C", 6, ElementData::Class(ClassData::default())), unit);
    let add_exec = |model: &mut ElementModel, name: &str, offset, kind| {
        model.elements.add(
            Element::new(name, offset, ElementData::Executable(ExecutableData::new(kind))),
            class,
        )
    };
    let method = add_exec(&mut model, "m", 12, ExecutableKind::Method);
    let getter = add_exec(&mut model, "x", 20, ExecutableKind::Getter);
    let setter = add_exec(&mut model, "x=", 20, ExecutableKind::Setter);
    let ctor = add_exec(&mut model, "", 6, ExecutableKind::Constructor);
    let named = add_exec(&mut model, "named", 30, ExecutableKind::Constructor);
    let field = model.elements.add(
        Element::new("x", 20, ElementData::Variable(VariableData::new(VariableKind::Field))),
        class,
    );
    if let Some(data) = model.element_mut(class).and_then(Element::as_class_mut) {
        data.methods.push(method);
        data.accessors.extend([getter, setter]);
        data.constructors.extend([ctor, named]);
        data.fields.push(field);
    }
    if let Some(data) = model.element_mut(unit).and_then(Element::as_unit_mut) {
        data.classes.push(class);
    }
    if let Some(data) = model.element_mut(library).and_then(Element::as_library_mut) {
        data.defining_unit = unit;
    }
    model.register_library(source, library);
    (model, library, class)
}

#[test]
fn test_direct_member_lookups() {
    let (model, _, class) = library_with_class();
    assert_eq!(model.name(model.get_method(class, "m")), "m");
    assert_eq!(model.kind(model.get_getter(class, "x")), Some(ElementKind::Getter));
    assert_eq!(model.kind(model.get_setter(class, "x")), Some(ElementKind::Setter));
    assert_eq!(model.get_setter(class, "x="), model.get_setter(class, "x"));
    assert_eq!(model.kind(model.get_field(class, "x")), Some(ElementKind::Field));
    assert_eq!(model.name(model.get_constructor(class, "named")), "named");
    assert!(model.get_constructor(class, "").is_some());
    assert!(model.get_method(class, "missing").is_none());

    assert_eq!(model.get_member(class, "m"), model.get_method(class, "m"));
    assert_eq!(model.get_member(class, "x"), model.get_getter(class, "x"));
    assert_eq!(model.get_member(class, "x="), model.get_setter(class, "x"));
    assert_eq!(model.class_members(class).len(), 3);
}

#[test]
fn test_default_class_data_has_dynamic_this_type() {
    let data = ClassData::default();
    assert_eq!(data.this_type, TypeId::DYNAMIC);
    assert_eq!(TypeId::default(), TypeId::DYNAMIC);
    assert!(data.supertype.is_none());
}

#[test]
fn test_operators_ending_in_eq_are_methods() {
    let (mut model, _, class) = library_with_class();
    let mut operators = Vec::new();
    for name in ["==", "[]=", "<=", ">="] {
        let operator = model.elements.add(
            Element::new(name, 40, ElementData::Executable(ExecutableData::new(ExecutableKind::Method))),
            class,
        );
        operators.push((name, operator));
    }
    if let Some(data) = model.element_mut(class).and_then(Element::as_class_mut) {
        data.methods.extend(operators.iter().map(|&(_, id)| id));
    }
    for (name, operator) in operators {
        assert!(!is_setter_name(name));
        assert_eq!(model.get_member(class, name), operator);
        assert!(model.get_setter(class, name).is_none());
        assert_eq!(model.element(operator).map(Element::display_name), Some(name));
    }
    assert!(is_setter_name("x="));
    assert_eq!(model.get_member(class, "x="), model.get_setter(class, "x"));
}

#[test]
fn test_navigation_through_enclosing_links() {
    let (model, library, class) = library_with_class();
    let method = model.get_method(class, "m");
    assert_eq!(model.elements.class_of(method), class);
    assert_eq!(model.elements.library_of(method), library);
    assert_eq!(model.elements.library_of(library), library);
    assert_eq!(
        model.source_of(method).map(Source::uri),
        Some("/lib/a.dart")
    );
    let ancestors: Vec<_> = model.elements.ancestors(method).collect();
    assert_eq!(ancestors.len(), 3, "class, unit and library");
}

#[test]
fn test_children_and_descendants() {
    let (model, library, class) = library_with_class();
    let children = model.elements.children(class);
    assert_eq!(children.len(), 6);
    assert_eq!(
        model.kind(children[0]),
        Some(ElementKind::Constructor),
        "constructors come first"
    );
    let all = model.elements.descendants(library);
    assert_eq!(all.len(), 8, "unit, class and its six members");
    assert!(!all.contains(&library));
}

#[test]
fn test_library_index() {
    let (mut model, library, _) = library_with_class();
    let source = Source::new("/lib/a.dart");
    assert_eq!(model.library(&source), Some(library));
    assert_eq!(model.library_units(library).len(), 1);
    assert!(!model.is_core_library(library));
    assert_eq!(model.forget_library(&source), Some(library));
    assert_eq!(model.library(&source), None);
}
