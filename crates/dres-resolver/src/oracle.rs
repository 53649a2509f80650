//! Compile-time constant queries used when checking annotations.

use dres_element::{Element, ElementFlags, ElementId, ElementModel};

/// Answers whether an element denotes a compile-time constant.
pub trait ConstantOracle {
    fn is_constant(&self, model: &ElementModel, element: ElementId) -> bool;
}

/// Trusts the `const` modifiers of declarations. An accessor is constant
/// when the variable behind it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredConstantOracle;

impl ConstantOracle for DeclaredConstantOracle {
    fn is_constant(&self, model: &ElementModel, element: ElementId) -> bool {
        if model.has_flag(element, ElementFlags::CONST) {
            return true;
        }
        model
            .element(element)
            .and_then(Element::as_executable)
            .is_some_and(|d| d.variable.is_some() && model.has_flag(d.variable, ElementFlags::CONST))
    }
}
