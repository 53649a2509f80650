use super::*;
use crate::display::display_type;
use crate::provider::find_class;
use crate::element::{
    ClassData, Element, ElementData, ExecutableData, ExecutableKind, LibraryData,
    TypeParameterData, UnitData,
};
use dres_common::Source;

struct Core {
    model: ElementModel,
    library: ElementId,
    unit: ElementId,
}

impl Core {
    fn new() -> Self {
        let mut model = ElementModel::new();
        let source = Source::new("dart:core");
        let library = model.elements.add(
            Element::new(
                "dart.core",
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
        if let Some(lib) = model.element_mut(library).and_then(Element::as_library_mut) {
            lib.defining_unit = unit;
        }
        model.register_library(source, library);
        Self {
            model,
            library,
            unit,
        }
    }

    fn class(&mut self, name: &str, type_params: &[&str], supertype: Option<TypeId>) -> ElementId {
        let offset = self.model.elements.len() as u32;
        let class = self.model.elements.add(
            Element::new(name, offset, ElementData::Class(ClassData::default())),
            self.unit,
        );
        let mut params = Vec::new();
        for &param in type_params {
            let id = self.model.elements.add(
                Element::new(
                    param,
                    offset,
                    ElementData::TypeParameter(TypeParameterData {
                        bound: None,
                        ty: TypeId::DYNAMIC,
                    }),
                ),
                class,
            );
            let ty = self.model.types.type_parameter(id);
            if let Some(data) = self.model.element_mut(id).and_then(Element::as_type_parameter_mut) {
                data.ty = ty;
            }
            params.push(id);
        }
        let param_types: Vec<TypeId> = params.iter().map(|&p| self.model.element_type(p)).collect();
        let this_type = self.model.types.interface(class, param_types);
        if let Some(data) = self.model.element_mut(class).and_then(Element::as_class_mut) {
            data.type_parameters = params;
            data.supertype = supertype;
            data.this_type = this_type;
        }
        if let Some(unit) = self.model.element_mut(self.unit).and_then(Element::as_unit_mut) {
            unit.classes.push(class);
        }
        class
    }

    fn ty(&self, class: ElementId) -> TypeId {
        self.model.element_type(class)
    }

    fn param(&self, class: ElementId, index: usize) -> TypeId {
        self.model.type_parameter_types(class)[index]
    }

    fn implement(&mut self, class: ElementId, interfaces: Vec<TypeId>) {
        if let Some(data) = self.model.element_mut(class).and_then(Element::as_class_mut) {
            data.interfaces = interfaces;
        }
    }

    fn method(&mut self, class: ElementId, name: &str, ty: TypeId) -> ElementId {
        let mut data = ExecutableData::new(ExecutableKind::Method);
        data.ty = ty;
        data.return_type = self.model.types.return_type(ty).unwrap_or(TypeId::DYNAMIC);
        let id = self
            .model
            .elements
            .add(Element::new(name, 0, ElementData::Executable(data)), class);
        if let Some(c) = self.model.element_mut(class).and_then(Element::as_class_mut) {
            c.methods.push(id);
        }
        id
    }

    fn positional(&self, params: &[TypeId], ret: TypeId) -> TypeId {
        self.model.types.function(
            ElementId::NONE,
            params.iter().map(|&ty| FunctionParam {
                kind: ParameterKind::Required,
                name: String::new(),
                ty,
            }),
            ret,
        )
    }
}

struct Fixture {
    core: Core,
    provider: TypeProvider,
    object: TypeId,
    num: TypeId,
    int: TypeId,
    double: TypeId,
    string: TypeId,
    list: ElementId,
}

fn fixture() -> Fixture {
    fixture_with(|_| {})
}

fn fixture_with(extra: impl FnOnce(&mut Core)) -> Fixture {
    let mut core = Core::new();
    let object_class = core.class("Object", &[], None);
    let object = core.ty(object_class);
    let sup = Some(object);
    let num_class = core.class("num", &[], sup);
    let num = core.ty(num_class);
    let int_class = core.class("int", &[], Some(num));
    let double_class = core.class("double", &[], Some(num));
    for name in ["bool", "String", "Symbol", "Type", "Function", "Null"] {
        core.class(name, &[], sup);
    }
    let iterable = core.class("Iterable", &["E"], sup);
    let list = core.class("List", &["E"], sup);
    let list_e = core.param(list, 0);
    let iterable_of_e = core.model.types.interface(iterable, [list_e]);
    core.implement(list, vec![iterable_of_e]);
    core.class("Map", &["K", "V"], sup);
    extra(&mut core);

    let provider = TypeProvider::from_core_library(&core.model, core.library)
        .expect("core library declares every required class");
    let int = core.ty(int_class);
    let double = core.ty(double_class);
    let string = provider.string_type;
    Fixture {
        core,
        provider,
        object,
        num,
        int,
        double,
        string,
        list,
    }
}

impl Fixture {
    fn ts(&self) -> TypeSystem<'_> {
        TypeSystem::new(&self.core.model, &self.provider)
    }

    fn list_of(&self, element: TypeId) -> TypeId {
        self.core.model.types.interface(self.list, [element])
    }
}

#[test]
fn test_class_hierarchy_is_subtype() {
    let f = fixture();
    let ts = f.ts();
    assert!(ts.is_subtype(f.int, f.num));
    assert!(ts.is_subtype(f.int, f.object));
    assert!(!ts.is_subtype(f.num, f.int), "num is not a subtype of int");
    assert!(!ts.is_subtype(f.int, f.double));
    assert!(ts.is_assignable(f.num, f.int), "downcasts are assignable");
    assert!(!ts.is_assignable(f.int, f.string));
}

#[test]
fn test_dynamic_and_bottom() {
    let f = fixture();
    let ts = f.ts();
    assert!(ts.is_subtype(TypeId::DYNAMIC, f.int));
    assert!(ts.is_subtype(f.int, TypeId::DYNAMIC));
    assert!(ts.is_subtype(TypeId::BOTTOM, f.string));
    assert!(!ts.is_subtype(f.string, TypeId::BOTTOM));
    assert!(!ts.is_subtype(TypeId::VOID, f.object));

    assert!(ts.is_more_specific(f.int, TypeId::DYNAMIC));
    assert!(!ts.is_more_specific(TypeId::DYNAMIC, f.int));
    assert!(ts.is_more_specific(TypeId::BOTTOM, f.int));
}

#[test]
fn test_generic_arguments_are_covariant() {
    let f = fixture();
    let ts = f.ts();
    let list_int = f.list_of(f.int);
    let list_num = f.list_of(f.num);
    let list_dynamic = f.list_of(TypeId::DYNAMIC);
    assert!(ts.is_subtype(list_int, list_num));
    assert!(!ts.is_subtype(list_num, list_int));
    assert!(ts.is_subtype(list_dynamic, list_int));
    assert!(ts.is_subtype(list_int, list_dynamic));

    assert!(ts.is_more_specific(list_int, list_dynamic));
    assert!(!ts.is_more_specific(list_dynamic, list_int));
}

#[test]
fn test_supertypes_are_substituted() {
    let f = fixture();
    let ts = f.ts();
    let iterable = find_class(&f.core.model, f.core.library, "Iterable").expect("Iterable");
    let iterable_num = f.core.model.types.interface(iterable, [f.num]);
    let list_int = f.list_of(f.int);
    assert!(ts.is_subtype(list_int, iterable_num));

    let supers = ts.supertypes(list_int);
    let iterable_int = f.core.model.types.interface(iterable, [f.int]);
    assert!(supers.contains(&iterable_int), "List<int> implements Iterable<int>");
}

#[test]
fn test_substitute_function_type() {
    let f = fixture();
    let ts = f.ts();
    let e = f.core.param(f.list, 0);
    let list_e = f.list_of(e);
    let generic = f.core.positional(&[e, list_e], e);
    let concrete = ts.substitute(generic, &[e], &[f.int]);
    let expected = f.core.positional(&[f.int, f.list_of(f.int)], f.int);
    assert_eq!(concrete, expected);
    assert_eq!(display_type(&f.core.model, concrete), "(int, List<int>) -> int");

    let untouched = ts.substitute(f.int, &[e], &[f.string]);
    assert_eq!(untouched, f.int);
    let missing = ts.substitute(e, &[e], &[]);
    assert_eq!(missing, TypeId::DYNAMIC, "missing arguments become dynamic");
}

#[test]
fn test_function_subtyping() {
    let f = fixture();
    let ts = f.ts();
    let int_to_int = f.core.positional(&[f.int], f.int);
    let num_to_num = f.core.positional(&[f.num], f.num);
    let string_to_int = f.core.positional(&[f.string], f.int);
    let two_args = f.core.positional(&[f.int, f.int], f.int);
    let to_void = f.core.positional(&[f.int], TypeId::VOID);

    assert!(ts.is_subtype(int_to_int, num_to_num));
    assert!(!ts.is_subtype(int_to_int, string_to_int));
    assert!(!ts.is_subtype(int_to_int, two_args), "required counts must match");
    assert!(ts.is_subtype(int_to_int, to_void), "anything returns into void");
    assert!(ts.is_subtype(int_to_int, f.provider.function_type));
    assert!(ts.is_subtype(int_to_int, f.object));
}

#[test]
fn test_optional_and_named_parameters() {
    let f = fixture();
    let ts = f.ts();
    let types = &f.core.model.types;
    let param = |kind, name: &str, ty| FunctionParam {
        kind,
        name: name.to_string(),
        ty,
    };
    let with_optional = types.function(
        ElementId::NONE,
        [
            param(ParameterKind::Required, "", f.int),
            param(ParameterKind::Positional, "", f.int),
        ],
        TypeId::DYNAMIC,
    );
    let one_required = f.core.positional(&[f.int], TypeId::DYNAMIC);
    assert!(ts.is_subtype(with_optional, one_required));
    assert!(!ts.is_subtype(one_required, with_optional));

    let named_xy = types.function(
        ElementId::NONE,
        [
            param(ParameterKind::Named, "x", f.int),
            param(ParameterKind::Named, "y", f.int),
        ],
        TypeId::DYNAMIC,
    );
    let named_x = types.function(
        ElementId::NONE,
        [param(ParameterKind::Named, "x", f.num)],
        TypeId::DYNAMIC,
    );
    assert!(ts.is_subtype(named_xy, named_x));
    assert!(!ts.is_subtype(named_x, named_xy));
    assert_eq!(
        display_type(&f.core.model, with_optional),
        "(int, [int]) -> dynamic"
    );
    assert_eq!(
        display_type(&f.core.model, named_xy),
        "({x: int, y: int}) -> dynamic"
    );
}

#[test]
fn test_call_method_makes_class_a_function() {
    let mut callable = ElementId::NONE;
    let f = fixture_with(|core| {
        let object = core
            .model
            .element_type(find_class(&core.model, core.library, "Object").expect("Object"));
        callable = core.class("Adder", &[], Some(object));
        let int = core
            .model
            .element_type(find_class(&core.model, core.library, "int").expect("int"));
        let sig = core.positional(&[int], int);
        core.method(callable, "call", sig);
    });
    let ts = f.ts();
    let adder = f.core.ty(callable);
    let int_to_int = f.core.positional(&[f.int], f.int);
    let string_fn = f.core.positional(&[f.string], f.string);
    assert!(ts.is_subtype(adder, int_to_int));
    assert!(!ts.is_subtype(adder, string_fn));
    assert_eq!(ts.call_method_type(adder), Some(int_to_int));
}

#[test]
fn test_type_parameter_uses_bound() {
    let mut boxed = ElementId::NONE;
    let f = fixture_with(|core| {
        let object = core
            .model
            .element_type(find_class(&core.model, core.library, "Object").expect("Object"));
        let num = core
            .model
            .element_type(find_class(&core.model, core.library, "num").expect("num"));
        boxed = core.class("Box", &["T"], Some(object));
        let t = core.model.type_parameters(boxed)[0];
        if let Some(data) = core.model.element_mut(t).and_then(Element::as_type_parameter_mut) {
            data.bound = Some(num);
        }
    });
    let ts = f.ts();
    let t = f.core.param(boxed, 0);
    assert!(ts.is_subtype(t, f.num));
    assert!(ts.is_subtype(t, f.object));
    assert!(!ts.is_subtype(t, f.int));
    assert!(!ts.is_subtype(f.int, t), "nothing but bottom is below a type parameter");
    assert_eq!(ts.least_upper_bound(t, f.int), f.num);
}

#[test]
fn test_least_upper_bound_of_classes() {
    let f = fixture();
    let ts = f.ts();
    assert_eq!(ts.least_upper_bound(f.int, f.double), f.num);
    assert_eq!(ts.least_upper_bound(f.int, f.num), f.num);
    assert_eq!(ts.least_upper_bound(f.int, f.string), f.object);
    assert_eq!(ts.least_upper_bound(f.int, TypeId::BOTTOM), f.int);
    assert_eq!(ts.least_upper_bound(f.int, TypeId::DYNAMIC), TypeId::DYNAMIC);
    assert_eq!(
        ts.least_upper_bound(f.list_of(f.int), f.list_of(TypeId::DYNAMIC)),
        f.list_of(TypeId::DYNAMIC)
    );
}

#[test]
fn test_least_upper_bound_needs_unique_deepest_candidate() {
    let mut ids = Vec::new();
    let f = fixture_with(|core| {
        let object = core
            .model
            .element_type(find_class(&core.model, core.library, "Object").expect("Object"));
        let i = core.class("I", &[], Some(object));
        let j = core.class("J", &[], Some(object));
        let a = core.class("A", &[], Some(object));
        let b = core.class("B", &[], Some(object));
        let c = core.class("C", &[], Some(object));
        let (it, jt) = (core.ty(i), core.ty(j));
        core.implement(a, vec![it, jt]);
        core.implement(b, vec![it, jt]);
        core.implement(c, vec![it]);
        ids = vec![i, a, b, c];
    });
    let ts = f.ts();
    let [i, a, b, c] = [ids[0], ids[1], ids[2], ids[3]].map(|id| f.core.ty(id));
    assert_eq!(ts.least_upper_bound(a, b), f.object, "I and J tie at the same depth");
    assert_eq!(ts.least_upper_bound(a, c), i);
}

#[test]
fn test_union_specificity() {
    let f = fixture();
    let ts = f.ts();
    let int_or_string = ts.union(f.int, f.string);
    assert!(ts.is_more_specific(int_or_string, f.int));
    assert!(!ts.with_strict_unions(true).is_more_specific(int_or_string, f.int));
    assert!(ts.is_more_specific(int_or_string, f.object));

    let int_or_double = ts.union(f.int, f.double);
    assert!(ts.is_subtype(int_or_double, f.num));
    assert!(!ts.is_subtype(int_or_string, f.num));
    assert!(ts.is_subtype(f.int, int_or_string));
    assert_eq!(ts.least_upper_bound(int_or_double, f.int), f.num);
    assert_eq!(ts.union(f.int, TypeId::DYNAMIC), TypeId::DYNAMIC);
}

#[test]
fn test_missing_core_class_is_reported() {
    let core = Core::new();
    let err = TypeProvider::from_core_library(&core.model, core.library)
        .expect_err("empty library has no Object");
    assert_eq!(err.name, "Object");
    assert_eq!(err.to_string(), "core library does not declare class 'Object'");
}
