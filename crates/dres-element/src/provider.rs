//! Well-known types of the core library.

use crate::element::{Element, ElementId, ElementKind};
use crate::model::ElementModel;
use crate::types::TypeId;
use std::fmt;

/// A core class the provider needs was not declared by the core library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingCoreClass {
    pub name: &'static str,
}

impl fmt::Display for MissingCoreClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core library does not declare class '{}'", self.name)
    }
}

impl std::error::Error for MissingCoreClass {}

/// Interface types of `Object`, `bool`, `int` and the other classes the
/// analyzer gives fixed meaning to. Generic classes are stored with their own
/// type parameters as arguments; use [`TypeProvider::list_of`] and
/// [`TypeProvider::map_of`] for instantiations.
#[derive(Clone, Debug)]
pub struct TypeProvider {
    pub core_library: ElementId,
    pub object_type: TypeId,
    pub bool_type: TypeId,
    pub int_type: TypeId,
    pub double_type: TypeId,
    pub num_type: TypeId,
    pub string_type: TypeId,
    pub symbol_type: TypeId,
    pub type_type: TypeId,
    pub list_type: TypeId,
    pub map_type: TypeId,
    pub function_type: TypeId,
    pub null_type: TypeId,
    /// Optional; absent in minimal core libraries.
    pub iterable_type: Option<TypeId>,
}

impl TypeProvider {
    /// Build the provider from the classes declared in `core_library`.
    pub fn from_core_library(
        model: &ElementModel,
        core_library: ElementId,
    ) -> Result<Self, MissingCoreClass> {
        let find = |name: &'static str| -> Result<TypeId, MissingCoreClass> {
            find_class(model, core_library, name)
                .map(|class| model.element_type(class))
                .ok_or(MissingCoreClass { name })
        };
        Ok(Self {
            core_library,
            object_type: find("Object")?,
            bool_type: find("bool")?,
            int_type: find("int")?,
            double_type: find("double")?,
            num_type: find("num")?,
            string_type: find("String")?,
            symbol_type: find("Symbol")?,
            type_type: find("Type")?,
            list_type: find("List")?,
            map_type: find("Map")?,
            function_type: find("Function")?,
            null_type: find("Null")?,
            iterable_type: find("Iterable").ok(),
        })
    }

    pub fn object_class(&self, model: &ElementModel) -> ElementId {
        model.class_of_type(self.object_type)
    }

    pub fn list_of(&self, model: &ElementModel, element: TypeId) -> TypeId {
        let class = model.class_of_type(self.list_type);
        model.types.interface(class, [element])
    }

    pub fn map_of(&self, model: &ElementModel, key: TypeId, value: TypeId) -> TypeId {
        let class = model.class_of_type(self.map_type);
        model.types.interface(class, [key, value])
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        ty == self.int_type || ty == self.double_type || ty == self.num_type
    }
}

/// Class named `name` declared in any unit of `library`.
pub fn find_class(model: &ElementModel, library: ElementId, name: &str) -> Option<ElementId> {
    model
        .library_units(library)
        .into_iter()
        .filter_map(|unit| model.element(unit).and_then(Element::as_unit))
        .flat_map(|unit| unit.classes.iter().copied())
        .find(|&class| {
            model.kind(class) == Some(ElementKind::Class) && model.name(class) == name
        })
}
