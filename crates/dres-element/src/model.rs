//! The element model: elements, types and the library index.

use crate::arena::ElementArena;
use crate::element::{Element, ElementData, ElementFlags, ElementId, ElementKind};
use crate::types::{TypeData, TypeId, TypeInterner};
use dres_common::Source;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct ElementModel {
    pub elements: ElementArena,
    pub types: TypeInterner,
    libraries: FxHashMap<Source, ElementId>,
}

impl ElementModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    #[inline]
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    #[inline]
    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.elements.kind(id)
    }

    #[inline]
    pub fn name(&self, id: ElementId) -> &str {
        self.elements.name(id)
    }

    pub fn has_flag(&self, id: ElementId, flag: ElementFlags) -> bool {
        self.element(id).is_some_and(|e| e.flags.contains(flag))
    }

    /// Add `element` to the arena and list it in `container`.
    pub fn add_child(&mut self, element: Element, container: ElementId) -> ElementId {
        let id = self.elements.add(element, container);
        self.attach(container, id);
        id
    }

    /// List `child` in the kind-specific vector of `container`.
    pub fn attach(&mut self, container: ElementId, child: ElementId) {
        let Some(kind) = self.kind(child) else {
            return;
        };
        let Some(parent) = self.element_mut(container) else {
            return;
        };
        match (&mut parent.data, kind) {
            (ElementData::Library(d), ElementKind::CompilationUnit) => d.parts.push(child),
            (ElementData::Library(d), ElementKind::Import) => d.imports.push(child),
            (ElementData::Library(d), ElementKind::Export) => d.exports.push(child),
            (ElementData::Library(d), ElementKind::Prefix) => d.prefixes.push(child),
            (ElementData::Library(d), ElementKind::Function) => d.load_library = child,
            (ElementData::CompilationUnit(d), ElementKind::Class) => d.classes.push(child),
            (ElementData::CompilationUnit(d), ElementKind::FunctionTypeAlias) => {
                d.function_type_aliases.push(child)
            }
            (ElementData::CompilationUnit(d), ElementKind::Function) => d.functions.push(child),
            (ElementData::CompilationUnit(d), ElementKind::TopLevelVariable) => {
                d.top_level_variables.push(child)
            }
            (ElementData::CompilationUnit(d), ElementKind::Getter | ElementKind::Setter) => {
                d.accessors.push(child)
            }
            (ElementData::Class(d), ElementKind::TypeParameter) => d.type_parameters.push(child),
            (ElementData::Class(d), ElementKind::Constructor) => d.constructors.push(child),
            (ElementData::Class(d), ElementKind::Method) => d.methods.push(child),
            (ElementData::Class(d), ElementKind::Getter | ElementKind::Setter) => {
                d.accessors.push(child)
            }
            (ElementData::Class(d), ElementKind::Field) => d.fields.push(child),
            (ElementData::Executable(d), ElementKind::Parameter) => d.parameters.push(child),
            (ElementData::Executable(d), ElementKind::LocalVariable) => {
                d.local_variables.push(child)
            }
            (ElementData::Executable(d), ElementKind::Label) => d.labels.push(child),
            (ElementData::Executable(d), ElementKind::Function) => d.local_functions.push(child),
            (ElementData::Parameter(d), ElementKind::Parameter) => d.parameters.push(child),
            (ElementData::Variable(d), ElementKind::Function) => d.initializer = child,
            (ElementData::FunctionTypeAlias(d), ElementKind::TypeParameter) => {
                d.type_parameters.push(child)
            }
            (ElementData::FunctionTypeAlias(d), ElementKind::Parameter) => {
                d.parameters.push(child)
            }
            (_, kind) => {
                tracing::debug!(
                    container = container.0,
                    child = child.0,
                    ?kind,
                    "element kind cannot be listed in this container"
                );
            }
        }
    }

    // =========================================================================
    // Libraries
    // =========================================================================

    pub fn library(&self, source: &Source) -> Option<ElementId> {
        self.libraries.get(source).copied()
    }

    pub fn register_library(&mut self, source: Source, library: ElementId) {
        self.libraries.insert(source, library);
    }

    /// Drop the index entry for `source`. Elements stay in the arena but are
    /// no longer reachable through the index.
    pub fn forget_library(&mut self, source: &Source) -> Option<ElementId> {
        self.libraries.remove(source)
    }

    pub fn libraries(&self) -> impl Iterator<Item = (&Source, ElementId)> {
        self.libraries.iter().map(|(s, &id)| (s, id))
    }

    /// Defining unit followed by the parts.
    pub fn library_units(&self, library: ElementId) -> Vec<ElementId> {
        let Some(data) = self.element(library).and_then(Element::as_library) else {
            return Vec::new();
        };
        std::iter::once(data.defining_unit)
            .chain(data.parts.iter().copied())
            .filter(|u| u.is_some())
            .collect()
    }

    pub fn library_source(&self, library: ElementId) -> Option<&Source> {
        self.element(library)
            .and_then(Element::as_library)
            .map(|d| &d.source)
    }

    pub fn is_core_library(&self, library: ElementId) -> bool {
        self.library_source(library)
            .is_some_and(|s| s.uri() == "dart:core")
    }

    /// Unit containing the declaration of `id`, and that unit's source.
    pub fn source_of(&self, id: ElementId) -> Option<&Source> {
        let unit = self.elements.unit_of(id);
        self.element(unit).and_then(Element::as_unit).map(|u| &u.source)
    }

    // =========================================================================
    // Direct class members
    // =========================================================================

    fn find_in(&self, ids: &[ElementId], pred: impl Fn(&Element) -> bool) -> ElementId {
        ids.iter()
            .copied()
            .find(|&id| self.element(id).is_some_and(&pred))
            .unwrap_or(ElementId::NONE)
    }

    /// Method declared directly in `class`.
    pub fn get_method(&self, class: ElementId, name: &str) -> ElementId {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return ElementId::NONE;
        };
        self.find_in(&data.methods, |e| e.name == name)
    }

    /// Getter declared directly in `class`.
    pub fn get_getter(&self, class: ElementId, name: &str) -> ElementId {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return ElementId::NONE;
        };
        self.find_in(&data.accessors, |e| {
            e.kind() == ElementKind::Getter && e.name == name
        })
    }

    /// Setter declared directly in `class`; `name` is given without `=`.
    pub fn get_setter(&self, class: ElementId, name: &str) -> ElementId {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return ElementId::NONE;
        };
        let name = if is_setter_name(name) {
            &name[..name.len() - 1]
        } else {
            name
        };
        self.find_in(&data.accessors, |e| {
            e.kind() == ElementKind::Setter && e.display_name() == name
        })
    }

    pub fn get_field(&self, class: ElementId, name: &str) -> ElementId {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return ElementId::NONE;
        };
        self.find_in(&data.fields, |e| e.name == name)
    }

    /// Constructor named `name` (`""` for the unnamed one).
    pub fn get_constructor(&self, class: ElementId, name: &str) -> ElementId {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return ElementId::NONE;
        };
        self.find_in(&data.constructors, |e| e.name == name)
    }

    /// Direct member named `name`: a setter for setter names, else a method
    /// or getter.
    pub fn get_member(&self, class: ElementId, name: &str) -> ElementId {
        if is_setter_name(name) {
            return self.get_setter(class, name);
        }
        let method = self.get_method(class, name);
        if method.is_some() {
            return method;
        }
        self.get_getter(class, name)
    }

    /// Methods and accessors declared directly in `class`.
    pub fn class_members(&self, class: ElementId) -> Vec<ElementId> {
        let Some(data) = self.element(class).and_then(Element::as_class) else {
            return Vec::new();
        };
        data.accessors
            .iter()
            .chain(data.methods.iter())
            .copied()
            .collect()
    }

    pub fn is_proxy(&self, class: ElementId) -> bool {
        self.has_flag(class, ElementFlags::PROXY)
    }

    // =========================================================================
    // Types of elements
    // =========================================================================

    /// The declared type associated with an element.
    pub fn element_type(&self, id: ElementId) -> TypeId {
        let Some(element) = self.element(id) else {
            return TypeId::DYNAMIC;
        };
        match &element.data {
            ElementData::Class(d) => d.this_type,
            ElementData::Executable(d) => d.ty,
            ElementData::Variable(d) => d.ty,
            ElementData::Parameter(d) => d.ty,
            ElementData::TypeParameter(d) => d.ty,
            ElementData::FunctionTypeAlias(d) => d.ty,
            _ => TypeId::DYNAMIC,
        }
    }

    pub fn return_type(&self, executable: ElementId) -> TypeId {
        self.element(executable)
            .and_then(Element::as_executable)
            .map_or(TypeId::DYNAMIC, |d| d.return_type)
    }

    pub fn parameters(&self, id: ElementId) -> &[ElementId] {
        match self.element(id).map(|e| &e.data) {
            Some(ElementData::Executable(d)) => &d.parameters,
            Some(ElementData::FunctionTypeAlias(d)) => &d.parameters,
            Some(ElementData::Parameter(d)) => &d.parameters,
            _ => &[],
        }
    }

    pub fn type_parameters(&self, id: ElementId) -> &[ElementId] {
        match self.element(id).map(|e| &e.data) {
            Some(ElementData::Class(d)) => &d.type_parameters,
            Some(ElementData::FunctionTypeAlias(d)) => &d.type_parameters,
            _ => &[],
        }
    }

    /// Type-parameter types of a class or alias, in declaration order.
    pub fn type_parameter_types(&self, id: ElementId) -> Vec<TypeId> {
        self.type_parameters(id)
            .iter()
            .map(|&p| self.element_type(p))
            .collect()
    }

    /// Class element of an interface type.
    pub fn class_of_type(&self, ty: TypeId) -> ElementId {
        match self.types.lookup(ty) {
            Some(TypeData::Interface { element, .. }) => element,
            _ => ElementId::NONE,
        }
    }

    pub fn supertype(&self, class: ElementId) -> Option<TypeId> {
        self.element(class)
            .and_then(Element::as_class)
            .and_then(|d| d.supertype)
    }
}

/// Operators whose names end with `=` without naming a setter.
const EQ_OPERATORS: [&str; 4] = ["==", "[]=", "<=", ">="];

/// `x=` names a setter; `==`, `[]=`, `<=` and `>=` are operator methods.
pub fn is_setter_name(name: &str) -> bool {
    name.ends_with('=') && !EQ_OPERATORS.contains(&name)
}

#[cfg(test)]
#[path = "../tests/model_tests.rs"]
mod tests;
