//! Frames for declarations, and the enclosing chain of an arbitrary node.

use crate::annotations::UnitAnnotations;
use crate::scope::{Scope, ScopeKind};
use dres_element::{Element, ElementData, ElementId, ElementModel};
use dres_syntax::{NodeArena, NodeIndex, NodeKind};
use tracing::trace;

pub struct ScopeBuilder<'a> {
    model: &'a ElementModel,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(model: &'a ElementModel) -> Self {
        Self { model }
    }

    /// Type parameters of a class or alias.
    pub fn type_parameter_scope(&self, owner: ElementId) -> Scope {
        let mut scope = Scope::new(ScopeKind::TypeParameters, owner);
        for &p in self.model.type_parameters(owner) {
            scope.define(self.model.name(p), p);
        }
        scope
    }

    /// Members declared directly in `class`.
    pub fn class_scope(&self, class: ElementId) -> Scope {
        let mut scope = Scope::new(ScopeKind::Class, class);
        if let Some(data) = self.model.element(class).and_then(Element::as_class) {
            for &member in data.accessors.iter().chain(data.methods.iter()) {
                scope.define(self.model.name(member), member);
            }
        }
        scope
    }

    /// Parameters of an executable.
    pub fn function_scope(&self, executable: ElementId) -> Scope {
        let mut scope = Scope::new(ScopeKind::Function, executable);
        for &p in self.model.parameters(executable) {
            scope.define(self.model.name(p), p);
        }
        scope
    }

    /// Type parameters and parameters of a function type alias.
    pub fn function_type_scope(&self, alias: ElementId) -> Scope {
        let mut scope = Scope::new(ScopeKind::FunctionType, alias);
        for &p in self.model.type_parameters(alias) {
            scope.define(self.model.name(p), p);
        }
        for &p in self.model.parameters(alias) {
            scope.define(self.model.name(p), p);
        }
        scope
    }

    /// Frames for `element` when entering its declaration.
    pub fn frames_for(&self, element: ElementId) -> Vec<Scope> {
        match self.model.element(element).map(|e| &e.data) {
            Some(ElementData::Class(_)) => vec![
                self.type_parameter_scope(element),
                self.class_scope(element),
            ],
            Some(ElementData::FunctionTypeAlias(_)) => vec![self.function_type_scope(element)],
            Some(ElementData::Executable(_)) => vec![self.function_scope(element)],
            _ => Vec::new(),
        }
    }

    /// Frames enclosing `node` (outermost first), for resolving a subtree
    /// in isolation. Declarations on the path must have been built.
    pub fn scopes_for(
        &self,
        arena: &NodeArena,
        annotations: &UnitAnnotations,
        node: NodeIndex,
    ) -> Vec<Scope> {
        let mut path: Vec<NodeIndex> = arena.ancestors(node).collect();
        path.reverse();
        let mut frames = Vec::new();
        for ancestor in path {
            let Some(kind) = arena.kind(ancestor) else {
                continue;
            };
            if matches!(
                kind,
                NodeKind::ClassDeclaration { .. }
                    | NodeKind::ClassTypeAlias { .. }
                    | NodeKind::FunctionTypeAlias { .. }
                    | NodeKind::ConstructorDeclaration { .. }
                    | NodeKind::MethodDeclaration { .. }
                    | NodeKind::FunctionDeclaration { .. }
            ) {
                let element = annotations.declared_element(ancestor);
                trace!(node = ancestor.0, element = element.0, "enclosing frame");
                frames.extend(self.frames_for(element));
            }
        }
        frames
    }
}
