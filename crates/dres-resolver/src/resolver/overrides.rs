//! Type overrides: the believed type of a variable after an assignment,
//! valid for the rest of the enclosing flow scope.

use super::ResolverVisitor;
use crate::variable_resolver::is_write_context;
use dres_element::{Element, ElementId, ElementKind, TypeId};
use dres_syntax::{NodeIndex, NodeKind};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Variable to overriding type; `None` resets a variable to its declared
/// type, hiding overrides from outer scopes.
pub type Overrides = FxHashMap<ElementId, Option<TypeId>>;

#[derive(Debug)]
pub struct OverrideManager {
    scopes: Vec<Overrides>,
}

impl Default for OverrideManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideManager {
    pub fn new() -> Self {
        Self {
            scopes: vec![Overrides::default()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Overrides::default());
    }

    /// Leave the innermost scope and return the overrides made in it.
    pub fn exit_scope(&mut self) -> Overrides {
        if self.scopes.len() == 1 {
            return std::mem::take(&mut self.scopes[0]);
        }
        self.scopes.pop().unwrap_or_default()
    }

    pub fn set_type(&mut self, variable: ElementId, ty: Option<TypeId>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(variable, ty);
        }
    }

    /// Overriding type of `variable`, if any scope overrides it.
    pub fn get_type(&self, variable: ElementId) -> Option<TypeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&variable))
            .copied()
            .flatten()
    }

    /// Copy `overrides` into the innermost scope.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.extend(overrides);
        }
    }
}

impl ResolverVisitor<'_> {
    /// Record that `variable` now holds a value of type `potential`. An
    /// assignment may lose precision; an initializer only narrows.
    pub(crate) fn override_variable(&mut self, variable: ElementId, potential: TypeId, allow_precision_loss: bool) {
        if potential.is_bottom() {
            return;
        }
        let Some(kind) = self.model.kind(variable) else {
            return;
        };
        match kind {
            ElementKind::LocalVariable | ElementKind::Parameter => {
                let current = self
                    .overrides
                    .get_type(variable)
                    .unwrap_or_else(|| self.model.element_type(variable));
                if potential == current {
                    return;
                }
                if allow_precision_loss {
                    trace!(variable = variable.0, ty = potential.0, "override");
                    let ty = (!potential.is_dynamic()).then_some(potential);
                    self.overrides.set_type(variable, ty);
                } else if !potential.is_dynamic() && !self.ts().is_more_specific(current, potential) {
                    trace!(variable = variable.0, ty = potential.0, "override");
                    self.overrides.set_type(variable, Some(potential));
                }
            }
            ElementKind::Field | ElementKind::TopLevelVariable => {
                let is_constant = self
                    .model
                    .element(variable)
                    .is_some_and(|e| e.is_final() || e.is_const());
                let declared = self.model.element_type(variable);
                if is_constant && potential != declared && self.ts().is_more_specific(potential, declared) {
                    if let Some(data) = self
                        .model
                        .element_mut(variable)
                        .and_then(Element::as_variable_mut)
                    {
                        data.propagated_type = Some(potential);
                    }
                }
            }
            _ => {}
        }
    }

    /// Locals and parameters assigned anywhere under `node`.
    pub(crate) fn assigned_variables(&self, node: NodeIndex) -> Vec<ElementId> {
        let arena = self.unit.arena;
        let mut out = Vec::new();
        for n in arena.descendants(node) {
            if !matches!(arena.kind(n), Some(NodeKind::SimpleIdentifier { .. })) {
                continue;
            }
            if !is_write_context(arena, n) {
                continue;
            }
            let element = self.annotations.static_element(n);
            if matches!(
                self.model.kind(element),
                Some(ElementKind::LocalVariable | ElementKind::Parameter)
            ) && !out.contains(&element)
            {
                out.push(element);
            }
        }
        out
    }

    /// Overrides surviving an `if` whose branches made `then` and `other`.
    pub(crate) fn merge_branch_overrides(&self, then: Overrides, other: Overrides) -> Overrides {
        let mut merged = Overrides::default();
        let variables: Vec<ElementId> = then.keys().chain(other.keys()).copied().collect();
        for variable in variables {
            if merged.contains_key(&variable) {
                continue;
            }
            let outer = self
                .overrides
                .get_type(variable)
                .unwrap_or_else(|| self.model.element_type(variable));
            let a = then.get(&variable).copied().unwrap_or(Some(outer));
            let b = other.get(&variable).copied().unwrap_or(Some(outer));
            let ty = match (a, b) {
                (Some(a), Some(b)) if a == b => Some(a),
                (Some(a), Some(b)) if self.options.enable_union_types => Some(self.ts().union(a, b)),
                _ => None,
            };
            merged.insert(variable, ty);
        }
        merged
    }
}
